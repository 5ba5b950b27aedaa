//! Value codec
//!
//! Translates between caller-facing [`Value`]s and engine [`Datum`]s.
//!
//! | Value | Datum | Tag |
//! |-------|-------|-----|
//! | `Null` | `Null` | 1 |
//! | `Bool(b)` | `Int(0 \| 1)` | 3 |
//! | `Number(n)` | `Double(n)` | 4 |
//! | `Text(s)` | `Str(s)` | 5 |
//! | `Blob(p)` | `Blob(8 LE bytes)` | 8 |
//! | `Record(r)` | `Record(ptr)` | 2 |
//!
//! Decoding is driven by the engine's field tag, not by the datum shape:
//! an `Int` field always decodes to `Bool`, and a tag the binding does not
//! know decodes to `Null`. `Illegal` decodes to no value at all.

use byteorder::{ByteOrder, LittleEndian};

use wgbind_core::{Datum, Error, FieldType, Result, Value};

use crate::database::Database;

/// Width of an encoded blob payload
pub const BLOB_WIDTH: usize = 8;

/// Encode a value for storage in `db`
///
/// Record references must belong to `db` and must not be stale.
pub fn encode(db: &Database, value: &Value) -> Result<Datum> {
    Ok(match value {
        Value::Null => Datum::Null,
        Value::Bool(b) => Datum::Int(i64::from(*b)),
        Value::Number(n) => Datum::Double(*n),
        Value::Text(s) => Datum::Str(s.clone()),
        Value::Blob(payload) => {
            let mut bytes = vec![0u8; BLOB_WIDTH];
            LittleEndian::write_u64(&mut bytes, *payload);
            Datum::Blob(bytes)
        }
        Value::Record(r) => {
            if r.instance != db.id() {
                return Err(Error::CrossInstanceReference);
            }
            Datum::Record(db.resolve(*r)?)
        }
    })
}

/// Decode a field read from `db`
///
/// `tag` is the raw field-type code reported by the engine for the same
/// field. `None` means "no value" (illegal field), which is distinct from
/// `Some(Value::Null)`.
pub fn decode(db: &Database, tag: i64, datum: Datum) -> Option<Value> {
    let Some(field_type) = FieldType::from_raw(tag) else {
        return Some(Value::Null);
    };
    match (field_type, datum) {
        (FieldType::Illegal, _) | (_, Datum::Illegal) => None,
        (FieldType::Null, _) => Some(Value::Null),
        (FieldType::Int, Datum::Int(i)) => Some(Value::Bool(i != 0)),
        (FieldType::Double, Datum::Double(d)) => Some(Value::Number(d)),
        (FieldType::Str, Datum::Str(s)) => Some(Value::Text(s)),
        (FieldType::Blob, Datum::Blob(bytes)) if bytes.len() == BLOB_WIDTH => {
            Some(Value::Blob(LittleEndian::read_u64(&bytes)))
        }
        (FieldType::Record, Datum::Record(ptr)) => Some(Value::Record(db.register(ptr))),
        _ => None,
    }
}

/// One-line rendering of a decoded field
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => "<illegal>".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Text(s)) => format!("{:?}", s),
        Some(Value::Blob(p)) => format!("blob({:#x})", p),
        Some(Value::Record(r)) => format!("rec#{}", r.slot),
    }
}
