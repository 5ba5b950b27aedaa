//! Error types for wgbind
//!
//! This module defines the single error enum used by every layer of the
//! binding. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Engine failures always carry the name of the binding operation and the
//! raw engine status code, so nothing the engine reports is swallowed.

use std::io;
use thiserror::Error;

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the binding layer
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid attach parameters, malformed query input, bad config file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Field index outside `1..=len`
    #[error("Field index {index} out of range for record of {len} field(s)")]
    OutOfRange {
        /// 1-based index requested by the caller
        index: usize,
        /// Number of fields in the record
        len: usize,
    },

    /// A value kind that cannot cross the codec boundary in this position
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A record reference owned by a different database instance
    #[error("Type mismatch: record reference belongs to another database instance")]
    CrossInstanceReference,

    /// Handle whose record has been deleted (generation no longer matches)
    #[error("Stale record handle (slot {slot}, generation {generation})")]
    StaleHandle {
        /// Arena slot of the handle
        slot: u32,
        /// Generation the handle was issued with
        generation: u32,
    },

    /// Delete blocked because other records still reference the record
    #[error("Record is referenced by other records (engine status {code})")]
    ReferencedByOthers {
        /// Raw engine status
        code: i64,
    },

    /// Unrecoverable engine-side failure
    #[error("Engine failure in {op} (engine status {code})")]
    EngineFatal {
        /// Binding operation that observed the failure
        op: &'static str,
        /// Raw engine status
        code: i64,
    },

    /// Engine-side query resources that were never released
    #[error("{count} engine resource(s) not released ({op})")]
    ResourceNotReleased {
        /// Operation that detected the leak
        op: &'static str,
        /// Number of unreleased resources
        count: usize,
    },

    /// Begin without matching end, or double begin
    #[error("Lock state violation in {op}: {reason}")]
    LockStateViolation {
        /// Lock operation that was rejected
        op: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },

    /// KV set on a record with no `Null` field left to use as a slot
    #[error("No free slot for key '{name}'")]
    NoFreeSlot {
        /// Key that could not be stored
        name: String,
    },

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for an engine failure
    pub fn engine(op: &'static str, code: i64) -> Self {
        Error::EngineFatal { op, code }
    }

    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Whether the caller can repair the condition and retry
    ///
    /// Only `ReferencedByOthers` qualifies: unlinking the record from every
    /// parent makes the delete succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ReferencedByOthers { .. })
    }

    /// Raw engine status carried by this error, if any
    pub fn engine_code(&self) -> Option<i64> {
        match self {
            Error::ReferencedByOthers { code } | Error::EngineFatal { code, .. } => Some(*code),
            _ => None,
        }
    }
}
