//! MemoryDb: one connection to a MemoryEngine store
//!
//! Every trait call bumps the engine's shared call counter first, so tests
//! can assert that an exhausted cursor stops calling into the engine.
//! Calls on a detached connection fail the way a stale engine handle
//! would: negative status, `None`, or [`Datum::Illegal`].

use std::any::Any;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use wgbind_core::{Condition, Datum, IndexKind, NativeDb, QueryArg, QueryId, RecordPtr};

use crate::journal::{self, JournalEntry, JournalWriter};
use crate::store::{Store, StoreInner, STATUS_FATAL, STATUS_INVALID, STATUS_OK};
use crate::{csv_io, dump, query, EngineStats};

/// A connection handed out by [`crate::MemoryEngine`]
#[derive(Debug)]
pub struct MemoryDb {
    store: Arc<Store>,
    stats: Arc<EngineStats>,
    attached: AtomicBool,
    local: bool,
}

impl MemoryDb {
    pub(crate) fn new(store: Arc<Store>, stats: Arc<EngineStats>, local: bool) -> Self {
        Self {
            store,
            stats,
            attached: AtomicBool::new(true),
            local,
        }
    }

    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub(crate) fn is_local(&self) -> bool {
        self.local
    }

    /// Whether this connection is still attached
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Number of queries this store has not released
    pub fn open_queries(&self) -> usize {
        self.store.inner.read().queries.len()
    }

    /// Number of indexes registered on this store
    pub fn index_count(&self) -> usize {
        self.store.inner.read().indexes.len()
    }

    /// Whether mutations are currently journaled
    pub fn is_logging(&self) -> bool {
        self.store.inner.read().journal.is_some()
    }

    fn enter(&self) -> bool {
        self.stats.record_call();
        self.is_attached()
    }

    fn journal(&self, inner: &mut StoreInner, entry: JournalEntry) {
        if let Some(writer) = inner.journal.as_mut() {
            if let Err(e) = writer.append(&entry) {
                warn!(
                    target: "wgbind::storage",
                    store = %self.store.label(),
                    error = %e,
                    "Journal append failed, logging stopped"
                );
                inner.journal = None;
            }
        }
    }

    fn find(&self, column: usize, cond: Condition, key: Datum, after: Option<RecordPtr>) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        self.store
            .inner
            .read()
            .find(column, cond, &key, after)
            .map(RecordPtr::new)
    }

    pub(crate) fn enable_journal(store: &Store, inner: &mut StoreInner) -> i64 {
        if inner.journal.is_some() {
            return STATUS_INVALID;
        }
        match JournalWriter::open(&store.log_path) {
            Ok(writer) => {
                debug!(target: "wgbind::storage", store = %store.label(), path = %store.log_path.display(), "Journal started");
                inner.journal = Some(writer);
                STATUS_OK
            }
            Err(e) => {
                warn!(target: "wgbind::storage", store = %store.label(), error = %e, "Journal open failed");
                STATUS_FATAL
            }
        }
    }
}

fn io_status(op: &str, store: &Store, result: std::io::Result<usize>) -> i64 {
    match result {
        Ok(count) => {
            debug!(target: "wgbind::storage", store = %store.label(), op, count, "File operation done");
            STATUS_OK
        }
        Err(e) => {
            warn!(target: "wgbind::storage", store = %store.label(), op, error = %e, "File operation failed");
            if e.kind() == std::io::ErrorKind::InvalidData {
                STATUS_INVALID
            } else {
                STATUS_FATAL
            }
        }
    }
}

impl NativeDb for MemoryDb {
    fn detach(&self) -> i64 {
        self.stats.record_call();
        if self.attached.swap(false, Ordering::AcqRel) {
            STATUS_OK
        } else {
            STATUS_INVALID
        }
    }

    // ========== Records ==========

    fn create_record(&self, len: usize) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        let mut inner = self.store.inner.write();
        let id = inner.create(len)?;
        self.journal(&mut inner, JournalEntry::Create { id, len });
        Some(RecordPtr::new(id))
    }

    fn delete_record(&self, rec: RecordPtr) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let mut inner = self.store.inner.write();
        let status = inner.delete(rec.as_u64());
        if status == STATUS_OK {
            self.journal(&mut inner, JournalEntry::Delete { id: rec.as_u64() });
        }
        status
    }

    fn first_record(&self) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        self.store.inner.read().first().map(RecordPtr::new)
    }

    fn next_record(&self, rec: RecordPtr) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        self.store
            .inner
            .read()
            .next_after(rec.as_u64())
            .map(RecordPtr::new)
    }

    fn first_parent(&self, rec: RecordPtr) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        self.store
            .inner
            .read()
            .first_parent(rec.as_u64())
            .map(RecordPtr::new)
    }

    fn next_parent(&self, rec: RecordPtr, parent: RecordPtr) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        self.store
            .inner
            .read()
            .next_parent(rec.as_u64(), parent.as_u64())
            .map(RecordPtr::new)
    }

    fn record_len(&self, rec: RecordPtr) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        self.store
            .inner
            .read()
            .records
            .get(&rec.as_u64())
            .map_or(STATUS_INVALID, |fields| fields.len() as i64)
    }

    // ========== Fields ==========

    fn field_type(&self, rec: RecordPtr, index: usize) -> i64 {
        if !self.enter() {
            return 0;
        }
        self.store
            .inner
            .read()
            .field(rec.as_u64(), index)
            .map_or(0, |d| d.field_type().as_raw())
    }

    fn get_field(&self, rec: RecordPtr, index: usize) -> Datum {
        if !self.enter() {
            return Datum::Illegal;
        }
        self.store
            .inner
            .read()
            .field(rec.as_u64(), index)
            .cloned()
            .unwrap_or(Datum::Illegal)
    }

    fn set_field(&self, rec: RecordPtr, index: usize, datum: Datum) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let mut inner = self.store.inner.write();
        let status = inner.set(rec.as_u64(), index, datum.clone());
        if status == STATUS_OK {
            self.journal(
                &mut inner,
                JournalEntry::Set {
                    id: rec.as_u64(),
                    index,
                    datum,
                },
            );
        }
        status
    }

    // ========== Typed search ==========

    fn find_record_double(
        &self,
        column: usize,
        cond: Condition,
        key: f64,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr> {
        self.find(column, cond, Datum::Double(key), after)
    }

    fn find_record_str(
        &self,
        column: usize,
        cond: Condition,
        key: &str,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr> {
        self.find(column, cond, Datum::Str(key.to_string()), after)
    }

    fn find_record_int(
        &self,
        column: usize,
        cond: Condition,
        key: i64,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr> {
        self.find(column, cond, Datum::Int(key), after)
    }

    fn find_record_null(
        &self,
        column: usize,
        cond: Condition,
        after: Option<RecordPtr>,
    ) -> Option<RecordPtr> {
        self.find(column, cond, Datum::Null, after)
    }

    // ========== Transactions ==========

    fn start_read(&self) -> i64 {
        if !self.enter() {
            return 0;
        }
        self.store.inner.write().locks.start_read()
    }

    fn end_read(&self, token: i64) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        self.store.inner.write().locks.end_read(token)
    }

    fn start_write(&self) -> i64 {
        if !self.enter() {
            return 0;
        }
        self.store.inner.write().locks.start_write()
    }

    fn end_write(&self, token: i64) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        self.store.inner.write().locks.end_write(token)
    }

    // ========== Indexes ==========

    fn column_to_index_id(&self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64 {
        if !self.enter() {
            return -1;
        }
        self.store.inner.read().indexes.lookup(column, kind, matches)
    }

    fn create_index(&self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        self.store.inner.write().indexes.create(column, kind, matches)
    }

    fn drop_index(&self, column: usize) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        self.store.inner.write().indexes.drop_column(column)
    }

    // ========== Queries ==========

    fn make_query(&self, args: &[QueryArg]) -> Option<QueryId> {
        if !self.enter() {
            return None;
        }
        let id = self.store.inner.write().queries.open(args);
        self.stats.query_opened();
        Some(QueryId::new(id))
    }

    fn fetch(&self, q: QueryId) -> Option<RecordPtr> {
        if !self.enter() {
            return None;
        }
        query::fetch(&mut self.store.inner.write(), q.as_u64()).map(RecordPtr::new)
    }

    fn free_query(&self, q: QueryId) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        if self.store.inner.write().queries.close(q.as_u64()) {
            self.stats.query_closed();
            STATUS_OK
        } else {
            STATUS_INVALID
        }
    }

    // ========== Dump / CSV / journal ==========

    fn dump(&self, path: &Path) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        io_status("dump", &self.store, dump::write(&self.store.inner.read(), path))
    }

    fn import_dump(&self, path: &Path) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let result = dump::read_into(&mut self.store.inner.write(), path);
        io_status("import_dump", &self.store, result)
    }

    fn import_csv(&self, path: &Path) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let result = csv_io::import(&mut self.store.inner.write(), path);
        io_status("import_csv", &self.store, result)
    }

    fn export_csv(&self, path: &Path) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        io_status("export_csv", &self.store, csv_io::export(&self.store.inner.read(), path))
    }

    fn start_logging(&self) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let mut inner = self.store.inner.write();
        Self::enable_journal(&self.store, &mut inner)
    }

    fn stop_logging(&self) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        match self.store.inner.write().journal.take() {
            Some(writer) => {
                debug!(target: "wgbind::storage", store = %self.store.label(), entries = writer.entries(), "Journal stopped");
                STATUS_OK
            }
            None => STATUS_INVALID,
        }
    }

    fn replay_log(&self, path: &Path) -> i64 {
        if !self.enter() {
            return STATUS_FATAL;
        }
        let entries = match journal::read_entries(path) {
            Ok(entries) => entries,
            Err(e) => return io_status("replay_log", &self.store, Err(e)),
        };
        let mut inner = self.store.inner.write();
        let applied = journal::replay(&mut inner, &entries);
        io_status("replay_log", &self.store, Ok(applied))
    }

    // ========== Sizes ==========

    fn database_size(&self) -> u64 {
        self.stats.record_call();
        self.store.inner.read().capacity
    }

    fn free_size(&self) -> u64 {
        self.stats.record_call();
        self.store.inner.read().free()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
