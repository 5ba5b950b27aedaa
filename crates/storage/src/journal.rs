//! Mutation journal
//!
//! Journal files are a flat sequence of framed entries:
//!
//! ```text
//! ┌─────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Payload (bincode)       │ CRC32 (4)│
//! └─────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! Length and CRC are little-endian; the CRC covers the payload only.
//! Replay stops at the first torn or corrupt frame.
//!
//! Entries carry the record ids of the store that wrote them. Replay maps
//! those ids onto freshly allocated records, so a journal can be replayed
//! into any store.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wgbind_core::{Datum, RecordPtr};

use crate::store::{StoreInner, STATUS_OK};

/// Upper bound on a single frame, guards against reading garbage lengths
const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// One journaled mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// Record allocated
    Create {
        /// Writer-side record id
        id: u64,
        /// Field count
        len: usize,
    },
    /// Field written
    Set {
        /// Writer-side record id
        id: u64,
        /// 0-based field
        index: usize,
        /// Encoded value
        datum: Datum,
    },
    /// Record deleted
    Delete {
        /// Writer-side record id
        id: u64,
    },
}

fn crc(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Append-only journal file writer
#[derive(Debug)]
pub struct JournalWriter {
    out: BufWriter<File>,
    path: PathBuf,
    entries: u64,
}

impl JournalWriter {
    /// Open `path` for appending, creating parent directories as needed
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            entries: 0,
        })
    }

    /// Append one framed entry and flush it
    pub fn append(&mut self, entry: &JournalEntry) -> io::Result<()> {
        let payload =
            bincode::serialize(entry).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.out.write_u32::<LittleEndian>(payload.len() as u32)?;
        self.out.write_all(&payload)?;
        self.out.write_u32::<LittleEndian>(crc(&payload))?;
        self.out.flush()?;
        self.entries += 1;
        Ok(())
    }

    /// Entries appended through this writer
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every intact entry of a journal file
///
/// A torn tail (EOF inside a frame) ends the read quietly; a CRC mismatch
/// is an `InvalidData` error.
pub fn read_entries(path: &Path) -> io::Result<Vec<JournalEntry>> {
    let mut input = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    loop {
        let len = match input.read_u32::<LittleEndian>() {
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };
        if len > MAX_FRAME_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("journal frame of {} bytes", len),
            ));
        }
        let mut payload = vec![0u8; len as usize];
        let stored_crc = match input
            .read_exact(&mut payload)
            .and_then(|_| input.read_u32::<LittleEndian>())
        {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(target: "wgbind::journal", path = %path.display(), "Torn journal tail ignored");
                break;
            }
            Err(e) => return Err(e),
        };
        if crc(&payload) != stored_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "journal frame checksum mismatch",
            ));
        }
        let entry = bincode::deserialize(&payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Apply journal entries to `store`, returning the number applied
///
/// Entries referring to records the journal never created are skipped.
pub(crate) fn replay(store: &mut StoreInner, entries: &[JournalEntry]) -> usize {
    let mut ids: FxHashMap<u64, u64> = FxHashMap::default();
    let mut applied = 0;
    for entry in entries {
        let ok = match entry {
            JournalEntry::Create { id, len } => match store.create(*len) {
                Some(new_id) => {
                    ids.insert(*id, new_id);
                    true
                }
                None => false,
            },
            JournalEntry::Set { id, index, datum } => {
                let datum = match datum {
                    Datum::Record(ptr) => match ids.get(&ptr.as_u64()) {
                        Some(mapped) => Datum::Record(RecordPtr::new(*mapped)),
                        None => continue,
                    },
                    other => other.clone(),
                };
                match ids.get(id) {
                    Some(target) => store.set(*target, *index, datum) == STATUS_OK,
                    None => false,
                }
            }
            JournalEntry::Delete { id } => match ids.remove(id) {
                Some(target) => store.delete(target) == STATUS_OK,
                None => false,
            },
        };
        if ok {
            applied += 1;
        }
    }
    debug!(target: "wgbind::journal", applied, total = entries.len(), "Journal replayed");
    applied
}
