//! The engine seam
//!
//! The storage engine is an external collaborator with a fixed, stable API.
//! These two traits are that API as seen from the binding:
//!
//! - [`Engine`]: process-level entry points (attach primitives and store
//!   destruction).
//! - [`NativeDb`]: one attached connection (records, fields, locks, indexes,
//!   queries, dump/CSV/journal services).
//!
//! Status conventions follow the engine: `0` is success and negative values
//! are failures. `delete_record` returns `-1` when other records still
//! reference the record. Lock starts return a token, `0` meaning refusal.
//! Fields are addressed 0-based here; the binding does the 1-based
//! translation.
//!
//! Implementations must be `Send + Sync`; the binding itself adds no
//! serialization beyond its lock-token bookkeeping.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use crate::types::{Condition, Datum, IndexKind, QueryArg, QueryId, RecordPtr};

/// Process-level engine entry points
pub trait Engine: Send + Sync {
    /// Attach to a named shared store, creating it with `size` bytes if needed
    fn attach_database(&self, name: &str, size: u64) -> Option<Arc<dyn NativeDb>>;

    /// Like [`Engine::attach_database`], creating the store with `permissions`
    fn attach_database_mode(
        &self,
        name: &str,
        size: u64,
        permissions: u32,
    ) -> Option<Arc<dyn NativeDb>>;

    /// Attach to a named shared store with journaling enabled
    fn attach_logged_database(&self, name: &str, size: u64) -> Option<Arc<dyn NativeDb>>;

    /// Like [`Engine::attach_logged_database`], creating the store with `permissions`
    fn attach_logged_database_mode(
        &self,
        name: &str,
        size: u64,
        permissions: u32,
    ) -> Option<Arc<dyn NativeDb>>;

    /// Attach to a named store that must already exist
    fn attach_existing_database(&self, name: &str) -> Option<Arc<dyn NativeDb>>;

    /// Create a private, unnamed store
    fn attach_local_database(&self, size: u64) -> Option<Arc<dyn NativeDb>>;

    /// Destroy a named shared store
    ///
    /// Connections still attached keep working until they detach; new
    /// attaches by name no longer find it.
    fn delete_database(&self, name: &str) -> i64;

    /// Destroy a local store after its connection has been detached
    fn delete_local_database(&self, db: &dyn NativeDb) -> i64;
}

/// One attached engine connection
pub trait NativeDb: Send + Sync {
    // ========== Lifecycle ==========

    /// Detach this connection from its store
    fn detach(&self) -> i64;

    // ========== Records ==========

    /// Allocate a record with `len` null fields
    fn create_record(&self, len: usize) -> Option<RecordPtr>;

    /// Delete a record (`-1`: referenced by others, other negatives: failure)
    fn delete_record(&self, rec: RecordPtr) -> i64;

    /// First record in engine order
    fn first_record(&self) -> Option<RecordPtr>;

    /// Record following `rec` in engine order
    fn next_record(&self, rec: RecordPtr) -> Option<RecordPtr>;

    /// First record holding a reference to `rec`
    fn first_parent(&self, rec: RecordPtr) -> Option<RecordPtr>;

    /// Parent of `rec` following `parent` in back-link order
    fn next_parent(&self, rec: RecordPtr, parent: RecordPtr) -> Option<RecordPtr>;

    /// Number of fields, negative on failure
    fn record_len(&self, rec: RecordPtr) -> i64;

    // ========== Fields ==========

    /// Raw field-type tag of field `index`
    fn field_type(&self, rec: RecordPtr, index: usize) -> i64;

    /// Encoded value of field `index`; [`Datum::Illegal`] on failure
    fn get_field(&self, rec: RecordPtr, index: usize) -> Datum;

    /// Store an encoded value into field `index`
    fn set_field(&self, rec: RecordPtr, index: usize, datum: Datum) -> i64;

    // ========== Typed search ==========

    /// Next record after `after` whose field `column` compares to a double
    fn find_record_double(
        &self,
        column: usize,
        cond: Condition,
        key: f64,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr>;

    /// Next record after `after` whose field `column` compares to a string
    fn find_record_str(
        &self,
        column: usize,
        cond: Condition,
        key: &str,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr>;

    /// Next record after `after` whose field `column` compares to an integer
    fn find_record_int(
        &self,
        column: usize,
        cond: Condition,
        key: i64,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr>;

    /// Next record after `after` whose field `column` compares to null
    fn find_record_null(
        &self,
        column: usize,
        cond: Condition,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr>;

    // ========== Transactions ==========

    /// Acquire a shared lock; returns a token, `0` on refusal
    fn start_read(&self) -> i64;

    /// Release a shared lock
    fn end_read(&self, token: i64) -> i64;

    /// Acquire the exclusive lock; returns a token, `0` on refusal
    fn start_write(&self) -> i64;

    /// Release the exclusive lock
    fn end_write(&self, token: i64) -> i64;

    // ========== Indexes ==========

    /// Id of the index on `column` with the given multi-value seed list, `-1` if none
    fn column_to_index_id(&self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64;

    /// Create an index on `column`
    fn create_index(&self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64;

    /// Drop every index on `column`
    fn drop_index(&self, column: usize) -> i64;

    // ========== Queries ==========

    /// Build a conjunctive query; `None` when the engine cannot allocate one
    fn make_query(&self, args: &[QueryArg]) -> Option<QueryId>;

    /// Next matching record, `None` when exhausted or unknown
    fn fetch(&self, query: QueryId) -> Option<RecordPtr>;

    /// Release a query
    fn free_query(&self, query: QueryId) -> i64;

    // ========== Dump / CSV / journal ==========

    /// Write a binary dump of the store
    fn dump(&self, path: &Path) -> i64;

    /// Replace the store content with a binary dump
    fn import_dump(&self, path: &Path) -> i64;

    /// Append records read from a CSV file
    fn import_csv(&self, path: &Path) -> i64;

    /// Write all records to a CSV file
    fn export_csv(&self, path: &Path) -> i64;

    /// Start journaling mutations
    fn start_logging(&self) -> i64;

    /// Stop journaling mutations
    fn stop_logging(&self) -> i64;

    /// Re-apply a journal file to the store
    fn replay_log(&self, path: &Path) -> i64;

    // ========== Sizes ==========

    /// Total store size in bytes
    fn database_size(&self) -> u64;

    /// Free bytes left in the store
    fn free_size(&self) -> u64;

    /// Downcast hook so an [`Engine`] can recognize its own connections
    fn as_any(&self) -> &dyn Any;
}
