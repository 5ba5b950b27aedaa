//! Identity, tag and request types for the engine seam
//!
//! This module defines:
//! - RecordPtr / QueryId / LockToken: opaque engine handles
//! - InstanceId / RecordRef: binding-side identity of instances and records
//! - FieldType / Datum: engine field tags and encoded field values
//! - Condition: comparison operators for find and query
//! - AttachMode / IndexKind / QueryArg: request vocabulary

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Engine handles
// ============================================================================

/// Opaque address of a record inside an engine store
///
/// The engine hands these out and owns the memory behind them. The binding
/// never dereferences one; it only passes it back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordPtr(u64);

impl RecordPtr {
    /// Wrap a raw engine address
    pub const fn new(raw: u64) -> Self {
        RecordPtr(raw)
    }

    /// Raw engine address
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Opaque engine query handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(u64);

impl QueryId {
    /// Wrap a raw engine query handle
    pub const fn new(raw: u64) -> Self {
        QueryId(raw)
    }

    /// Raw engine query handle
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Engine transaction token returned by a successful start_read/start_write
///
/// The engine signals refusal with a zero token, so a `LockToken` is never 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken(i64);

impl LockToken {
    /// Interpret a raw engine token; `None` when the engine refused
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(LockToken(raw))
        }
    }

    /// Raw engine token
    pub fn as_raw(self) -> i64 {
        self.0
    }
}

// ============================================================================
// Binding identity
// ============================================================================

/// Unique identifier of one attached database instance
///
/// Two instances attached to the same named store still have distinct ids,
/// so record references can never silently cross between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Create a fresh random instance id
    pub fn new() -> Self {
        InstanceId(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plain-data reference to a record, as stored inside [`crate::Value::Record`]
///
/// A `RecordRef` is only meaningful to the instance that issued it. The
/// `(slot, generation)` pair is checked against that instance's handle arena
/// on every use, so a reference to a deleted record fails cleanly instead of
/// reaching freed engine memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Instance that issued the reference
    pub instance: InstanceId,
    /// Arena slot
    pub slot: u32,
    /// Arena generation at issue time
    pub generation: u32,
}

// ============================================================================
// Field tags and encoded values
// ============================================================================

/// Engine field-type tags
///
/// Seven tags are known to the binding. Raw codes outside this set are
/// unrecognized and decode to `Null`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// No such field, or the read failed
    Illegal = 0,
    /// Explicit null
    Null = 1,
    /// Reference to another record
    Record = 2,
    /// Integer (booleans are stored as 0/1)
    Int = 3,
    /// IEEE-754 double
    Double = 4,
    /// UTF-8 string
    Str = 5,
    /// Opaque byte payload
    Blob = 8,
}

impl FieldType {
    /// Map a raw engine tag to a known field type
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(FieldType::Illegal),
            1 => Some(FieldType::Null),
            2 => Some(FieldType::Record),
            3 => Some(FieldType::Int),
            4 => Some(FieldType::Double),
            5 => Some(FieldType::Str),
            8 => Some(FieldType::Blob),
            _ => None,
        }
    }

    /// Raw engine tag
    pub fn as_raw(self) -> i64 {
        self as u8 as i64
    }

    /// Human-readable tag name
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Illegal => "illegal",
            FieldType::Null => "null",
            FieldType::Record => "record",
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::Str => "str",
            FieldType::Blob => "blob",
        }
    }
}

/// An engine-encoded field value
///
/// One variant per typed encode primitive of the engine, plus `Illegal`,
/// the marker the engine returns for a field it cannot read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    /// Encoded null
    Null,
    /// Encoded integer
    Int(i64),
    /// Encoded double
    Double(f64),
    /// Encoded string
    Str(String),
    /// Encoded blob
    Blob(Vec<u8>),
    /// Encoded record reference
    Record(RecordPtr),
    /// Engine's "no value" marker
    Illegal,
}

impl Datum {
    /// Tag the engine reports for this datum
    pub fn field_type(&self) -> FieldType {
        match self {
            Datum::Null => FieldType::Null,
            Datum::Int(_) => FieldType::Int,
            Datum::Double(_) => FieldType::Double,
            Datum::Str(_) => FieldType::Str,
            Datum::Blob(_) => FieldType::Blob,
            Datum::Record(_) => FieldType::Record,
            Datum::Illegal => FieldType::Illegal,
        }
    }

    /// Check if this is an encoded null
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Referenced record, if this is a record datum
    pub fn as_record(&self) -> Option<RecordPtr> {
        match self {
            Datum::Record(ptr) => Some(*ptr),
            _ => None,
        }
    }

    /// Numeric reading used by sum aggregation; non-numeric data yields `None`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Int(i) => Some(*i as f64),
            Datum::Double(d) => Some(*d),
            _ => None,
        }
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Comparison operator used by find cursors and query arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
}

impl Condition {
    /// All conditions, in symbol-table order
    pub const ALL: [Condition; 6] = [
        Condition::Equal,
        Condition::NotEqual,
        Condition::LessThan,
        Condition::Greater,
        Condition::LessOrEqual,
        Condition::GreaterOrEqual,
    ];

    /// Textual symbol used at the interface boundary
    pub fn as_symbol(self) -> &'static str {
        match self {
            Condition::Equal => "=",
            Condition::NotEqual => "!=",
            Condition::LessThan => "<",
            Condition::Greater => ">",
            Condition::LessOrEqual => "<=",
            Condition::GreaterOrEqual => ">=",
        }
    }

    /// Whether `field.cmp(key) == ordering` satisfies this condition
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Condition::Equal => ordering == Ordering::Equal,
            Condition::NotEqual => ordering != Ordering::Equal,
            Condition::LessThan => ordering == Ordering::Less,
            Condition::Greater => ordering == Ordering::Greater,
            Condition::LessOrEqual => ordering != Ordering::Greater,
            Condition::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Condition::ALL
            .iter()
            .copied()
            .find(|c| c.as_symbol() == s)
            .ok_or_else(|| Error::config(format!("unknown condition '{}'", s)))
    }
}

// ============================================================================
// Attach / index / query vocabulary
// ============================================================================

/// How a database instance is attached, and therefore how it is torn down
///
/// | Mode | Teardown |
/// |------|----------|
/// | Default | detach, then destroy the named store |
/// | Logged | detach, then destroy the named store |
/// | Local | detach, then destroy the local store |
/// | Existing | detach only |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachMode {
    /// Attach to (creating if needed) a named shared store
    #[default]
    Default,
    /// Like `Default`, with journaling enabled by the engine
    Logged,
    /// Private, unnamed store
    Local,
    /// Attach to a named store that must already exist
    Existing,
}

impl AttachMode {
    /// Map the raw integer mode (`0..=3`) used at the calling boundary
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(AttachMode::Default),
            1 => Ok(AttachMode::Logged),
            2 => Ok(AttachMode::Local),
            3 => Ok(AttachMode::Existing),
            other => Err(Error::config(format!(
                "invalid attach mode {} (expected 0..=3)",
                other
            ))),
        }
    }

    /// Raw integer mode
    pub fn as_raw(self) -> i64 {
        match self {
            AttachMode::Default => 0,
            AttachMode::Logged => 1,
            AttachMode::Local => 2,
            AttachMode::Existing => 3,
        }
    }

    /// Whether teardown destroys the underlying store
    pub fn destroys_on_teardown(self) -> bool {
        !matches!(self, AttachMode::Existing)
    }
}

/// Physical index structure requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexKind {
    /// T-tree (ordered) index
    #[default]
    TTree,
    /// Hash index
    Hash,
}

/// One native query argument: `field[column] <condition> datum`
///
/// `column` is 0-based; the conversion from the 1-based interface happens
/// in the query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryArg {
    /// 0-based field position
    pub column: usize,
    /// Comparison operator
    pub condition: Condition,
    /// Encoded comparison value
    pub datum: Datum,
}
