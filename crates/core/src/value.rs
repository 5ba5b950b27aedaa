//! Value types for wgbind
//!
//! This module defines:
//! - Value: the dynamic value model seen by callers
//!
//! ## Value Model
//!
//! The Value enum has exactly 6 variants, one per kind a dynamic caller can
//! hand to the binding:
//! - Null, Bool, Number, Text, Blob, Record
//!
//! ### Type Rules
//!
//! - `Bool(true) != Number(1.0)` - different kinds are never equal
//! - `Blob` carries a pointer-sized opaque payload, not a byte string
//! - `Record` carries a [`RecordRef`], which is only valid in the instance
//!   that issued it

use serde::{Deserialize, Serialize};

use crate::types::RecordRef;

/// Dynamic value crossing the binding boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit floating point number
    Number(f64),
    /// UTF-8 string
    Text(String),
    /// Pointer-sized opaque payload
    Blob(u64),
    /// Reference to a record of the same instance
    Record(RecordRef),
}

impl Value {
    /// Get the kind name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Blob(_) => "Blob",
            Value::Record(_) => "Record",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as f64 if this is a Number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str if this is a Text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the payload if this is a Blob value
    pub fn as_blob(&self) -> Option<u64> {
        match self {
            Value::Blob(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the reference if this is a Record value
    pub fn as_record(&self) -> Option<RecordRef> {
        match self {
            Value::Record(r) => Some(*r),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<RecordRef> for Value {
    fn from(r: RecordRef) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
