//! Core types and traits for wgbind
//!
//! This crate defines the foundational types used throughout the binding:
//! - Value: dynamic, caller-facing value enum
//! - Datum / FieldType: engine-encoded field values and their type tags
//! - Condition: the six comparison operators used by find and query
//! - AttachMode, IndexKind, QueryArg: engine request vocabulary
//! - RecordPtr, RecordRef, InstanceId: record and instance identity
//! - Error: error type hierarchy
//! - Traits: the engine seam (Engine, NativeDb)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use traits::{Engine, NativeDb};
pub use types::{
    AttachMode, Condition, Datum, FieldType, IndexKind, InstanceId, LockToken, QueryArg, QueryId,
    RecordPtr, RecordRef,
};
pub use value::Value;
