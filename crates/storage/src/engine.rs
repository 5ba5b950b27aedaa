//! MemoryEngine: store registry and attach primitives
//!
//! Named stores live in a per-engine registry (name → store). A connection
//! holds an `Arc` to its store, so deleting a named store only unregisters
//! it: connections still attached keep working until they detach, and the
//! memory goes away with the last of them.
//!
//! Local stores are never registered by name. They are tracked by id until
//! `delete_local_database` wipes them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use wgbind_core::{Engine, NativeDb};

use crate::connection::MemoryDb;
use crate::store::{Store, STATUS_INVALID, STATUS_OK};
use crate::EngineStats;

/// Capacity used when an attach asks for size 0
pub const DEFAULT_STORE_SIZE: u64 = 10_000_000;

/// Journal file extension
pub const JOURNAL_EXTENSION: &str = "wglog";

/// In-process engine with shared named stores and private local stores
#[derive(Debug)]
pub struct MemoryEngine {
    named: Mutex<HashMap<String, Arc<Store>>>,
    locals: Mutex<FxHashSet<u64>>,
    next_store_id: AtomicU64,
    default_size: u64,
    log_dir: PathBuf,
    stats: Arc<EngineStats>,
    last_attach: Mutex<Option<&'static str>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Create an engine journaling under the system temp directory
    pub fn new() -> Self {
        Self::with_log_dir(std::env::temp_dir().join("wgbind-journal"))
    }

    /// Create an engine journaling under `dir`
    pub fn with_log_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            named: Mutex::new(HashMap::new()),
            locals: Mutex::new(FxHashSet::default()),
            next_store_id: AtomicU64::new(1),
            default_size: DEFAULT_STORE_SIZE,
            log_dir: dir.into(),
            stats: Arc::new(EngineStats::default()),
            last_attach: Mutex::new(None),
        }
    }

    /// Override the capacity used for size-0 attaches
    pub fn with_default_size(mut self, size: u64) -> Self {
        self.default_size = size;
        self
    }

    /// Journal file used by the named store `name`
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{}.{}", name, JOURNAL_EXTENSION))
    }

    /// Directory journal files are written to
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Total trait calls made on connections of this engine
    pub fn call_count(&self) -> u64 {
        self.stats.calls()
    }

    /// Queries made and not yet freed, across all stores
    pub fn open_query_count(&self) -> u64 {
        self.stats.open_queries()
    }

    /// Whether a named store is registered
    pub fn has_store(&self, name: &str) -> bool {
        self.named.lock().contains_key(name)
    }

    /// Number of local stores not yet deleted
    pub fn live_local_stores(&self) -> usize {
        self.locals.lock().len()
    }

    /// Permission bits the named store was created with
    pub fn store_permissions(&self, name: &str) -> Option<u32> {
        self.named.lock().get(name).map(|store| store.permissions)
    }

    /// Name of the attach primitive most recently called on this engine
    pub fn last_attach(&self) -> Option<&'static str> {
        *self.last_attach.lock()
    }

    fn record_attach(&self, primitive: &'static str) {
        *self.last_attach.lock() = Some(primitive);
    }

    fn new_store(&self, name: Option<&str>, size: u64, permissions: u32) -> Arc<Store> {
        let id = self.next_store_id.fetch_add(1, Ordering::Relaxed);
        let capacity = if size == 0 { self.default_size } else { size };
        let log_path = match name {
            Some(n) => self.log_path(n),
            None => self
                .log_dir
                .join(format!("local-{}.{}", id, JOURNAL_EXTENSION)),
        };
        Arc::new(Store::new(
            id,
            name.map(str::to_string),
            capacity,
            permissions,
            log_path,
        ))
    }

    fn connect(&self, store: Arc<Store>, local: bool) -> Arc<dyn NativeDb> {
        Arc::new(MemoryDb::new(store, Arc::clone(&self.stats), local))
    }

    fn attach_named(
        &self,
        name: &str,
        size: u64,
        permissions: u32,
        logged: bool,
    ) -> Option<Arc<dyn NativeDb>> {
        if name.is_empty() {
            return None;
        }
        let store = {
            let mut named = self.named.lock();
            match named.get(name) {
                Some(store) => Arc::clone(store),
                None => {
                    let store = self.new_store(Some(name), size, permissions);
                    named.insert(name.to_string(), Arc::clone(&store));
                    info!(
                        target: "wgbind::storage",
                        name,
                        capacity = store.inner.read().capacity,
                        permissions = store.permissions,
                        "Store created"
                    );
                    store
                }
            }
        };
        if logged {
            let mut inner = store.inner.write();
            if inner.journal.is_none() && MemoryDb::enable_journal(&store, &mut inner) != STATUS_OK {
                return None;
            }
        }
        debug!(target: "wgbind::storage", name, logged, "Connection attached");
        Some(self.connect(store, false))
    }
}

impl Engine for MemoryEngine {
    fn attach_database(&self, name: &str, size: u64) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_database");
        self.attach_named(name, size, 0, false)
    }

    fn attach_database_mode(
        &self,
        name: &str,
        size: u64,
        permissions: u32,
    ) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_database_mode");
        self.attach_named(name, size, permissions, false)
    }

    fn attach_logged_database(&self, name: &str, size: u64) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_logged_database");
        self.attach_named(name, size, 0, true)
    }

    fn attach_logged_database_mode(
        &self,
        name: &str,
        size: u64,
        permissions: u32,
    ) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_logged_database_mode");
        self.attach_named(name, size, permissions, true)
    }

    fn attach_existing_database(&self, name: &str) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_existing_database");
        let store = self.named.lock().get(name).cloned()?;
        debug!(target: "wgbind::storage", name, "Connection attached to existing store");
        Some(self.connect(store, false))
    }

    fn attach_local_database(&self, size: u64) -> Option<Arc<dyn NativeDb>> {
        self.record_attach("attach_local_database");
        let store = self.new_store(None, size, 0);
        self.locals.lock().insert(store.id);
        debug!(target: "wgbind::storage", store = %store.label(), "Local store created");
        Some(self.connect(store, true))
    }

    fn delete_database(&self, name: &str) -> i64 {
        match self.named.lock().remove(name) {
            Some(_) => {
                info!(target: "wgbind::storage", name, "Store deleted");
                STATUS_OK
            }
            None => STATUS_INVALID,
        }
    }

    fn delete_local_database(&self, db: &dyn NativeDb) -> i64 {
        let Some(conn) = db.as_any().downcast_ref::<MemoryDb>() else {
            warn!(target: "wgbind::storage", "delete_local_database called with a foreign connection");
            return STATUS_INVALID;
        };
        if !conn.is_local() || !self.locals.lock().remove(&conn.store().id) {
            return STATUS_INVALID;
        }
        let mut inner = conn.store().inner.write();
        let orphaned = inner.queries.len() as u64;
        inner.wipe();
        drop(inner);
        self.stats.queries_dropped(orphaned);
        debug!(target: "wgbind::storage", store = %conn.store().label(), "Local store deleted");
        STATUS_OK
    }
}
