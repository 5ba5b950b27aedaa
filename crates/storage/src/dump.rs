//! Binary store dumps
//!
//! # Layout
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────┬──────────┐
//! │ Magic "WGDB" │ Version (4)  │ Image (bincode)      │ CRC32 (4)│
//! └──────────────┴──────────────┴──────────────────────┴──────────┘
//! ```
//!
//! The image keeps record ids, so references inside the dump stay intact.
//! Importing replaces the whole record table.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use wgbind_core::Datum;

use crate::store::StoreInner;

/// Magic bytes identifying a dump file
pub const DUMP_MAGIC: [u8; 4] = *b"WGDB";

/// Current dump format version
pub const DUMP_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DumpImage {
    next_id: u64,
    records: BTreeMap<u64, Vec<Datum>>,
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Write `store` to `path`
pub(crate) fn write(store: &StoreInner, path: &Path) -> io::Result<usize> {
    let image = DumpImage {
        next_id: store.next_id,
        records: store.records.clone(),
    };
    let payload =
        bincode::serialize(&image).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut bytes = Vec::with_capacity(payload.len() + 12);
    bytes.extend_from_slice(&DUMP_MAGIC);
    let mut word = [0u8; 4];
    LittleEndian::write_u32(&mut word, DUMP_FORMAT_VERSION);
    bytes.extend_from_slice(&word);
    bytes.extend_from_slice(&payload);
    LittleEndian::write_u32(&mut word, crc32fast::hash(&payload));
    bytes.extend_from_slice(&word);

    std::fs::write(path, bytes)?;
    Ok(image.records.len())
}

/// Replace the content of `store` with the dump at `path`
pub(crate) fn read_into(store: &mut StoreInner, path: &Path) -> io::Result<usize> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < 12 || bytes[0..4] != DUMP_MAGIC {
        return Err(invalid("not a dump file"));
    }
    let version = LittleEndian::read_u32(&bytes[4..8]);
    if version != DUMP_FORMAT_VERSION {
        return Err(invalid("unsupported dump version"));
    }
    let payload = &bytes[8..bytes.len() - 4];
    let stored_crc = LittleEndian::read_u32(&bytes[bytes.len() - 4..]);
    if crc32fast::hash(payload) != stored_crc {
        return Err(invalid("dump checksum mismatch"));
    }
    let image: DumpImage =
        bincode::deserialize(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let count = image.records.len();
    store.replace_records(image.records, image.next_id);
    Ok(count)
}
