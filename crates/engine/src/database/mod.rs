//! Database instance: one attached engine connection
//!
//! ## Lifecycle
//!
//! ```text
//! attach(engine, name, size, mode, permission)
//!     │
//!     ▼
//! Database ──► create / first / find / query ──► RecordHandle<'db>
//!     │
//!     ▼
//! detach(self) or Drop
//!     ├─ release outstanding read/write tokens
//!     ├─ engine detach
//!     └─ mode-dependent destroy (named store, local store, or nothing)
//! ```
//!
//! Teardown runs exactly once. Handles and cursors borrow the instance, so
//! the compiler rejects their use after `detach`.
//!
//! ## Thread Safety
//!
//! Internal bookkeeping sits behind `parking_lot` mutexes, so a `Database`
//! is memory-safe to share. The engine's lock tokens are per instance,
//! though: callers that share an instance across threads must serialize
//! their read/write transactions themselves.

mod arena;
pub mod config;
mod indexes;
mod services;
mod transactions;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use wgbind_core::{AttachMode, Engine, Error, InstanceId, NativeDb, RecordPtr, RecordRef, Result};

use crate::record::RecordHandle;
use arena::HandleArena;
pub use config::AttachConfig;
use transactions::LockState;

/// Engine status returned by `delete_record` when other records reference the target
pub(crate) const STATUS_REFERENCED: i64 = -1;

/// An attached database instance
pub struct Database {
    id: InstanceId,
    name: String,
    mode: AttachMode,
    permission: u32,
    engine: Arc<dyn Engine>,
    native: Arc<dyn NativeDb>,
    arena: Mutex<HandleArena>,
    locks: Mutex<LockState>,
    open_queries: AtomicUsize,
    torn_down: AtomicBool,
}

impl Database {
    /// Attach to a store
    ///
    /// | Mode | permission == 0 | permission != 0 |
    /// |------|-----------------|-----------------|
    /// | Default | `attach_database` | same |
    /// | Logged | `attach_logged_database` | `attach_logged_database_mode` |
    /// | Local | `attach_local_database` | same |
    /// | Existing | `attach_existing_database` | same |
    ///
    /// A `size` of 0 lets the engine pick its default.
    ///
    /// # Errors
    ///
    /// `Configuration` for an empty name; `EngineFatal` when the engine
    /// refuses the attach.
    pub fn attach(
        engine: Arc<dyn Engine>,
        name: &str,
        size: u64,
        mode: AttachMode,
        permission: u32,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::config("database name must not be empty"));
        }

        let native = match (mode, permission) {
            (AttachMode::Default, _) => engine.attach_database(name, size),
            (AttachMode::Logged, 0) => engine.attach_logged_database(name, size),
            (AttachMode::Logged, p) => engine.attach_logged_database_mode(name, size, p),
            (AttachMode::Local, _) => engine.attach_local_database(size),
            (AttachMode::Existing, _) => engine.attach_existing_database(name),
        }
        .ok_or(Error::engine("attach", 0))?;

        let db = Self {
            id: InstanceId::new(),
            name: name.to_string(),
            mode,
            permission,
            engine,
            native,
            arena: Mutex::new(HandleArena::new()),
            locks: Mutex::new(LockState::default()),
            open_queries: AtomicUsize::new(0),
            torn_down: AtomicBool::new(false),
        };
        info!(
            target: "wgbind::db",
            name = %db.name,
            mode = ?mode,
            size,
            permission,
            instance = %db.id,
            "Database attached"
        );
        Ok(db)
    }

    /// Attach using a parsed [`AttachConfig`]
    pub fn attach_with_config(engine: Arc<dyn Engine>, config: &AttachConfig) -> Result<Self> {
        config.validate()?;
        Self::attach(
            engine,
            &config.name,
            config.size,
            config.mode,
            config.permission,
        )
    }

    /// Detach, destroying the store unless attached in `Existing` mode
    ///
    /// # Errors
    ///
    /// `EngineFatal` if the engine rejects detach or destroy.
    /// `ResourceNotReleased` if query cursors were leaked (for instance
    /// with `mem::forget`); teardown has still completed in that case.
    pub fn detach(self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut first_error = self.release_outstanding_locks().err();

        let status = self.native.detach();
        if status != 0 {
            first_error.get_or_insert(Error::engine("detach", status));
        }

        let destroy = match self.mode {
            AttachMode::Existing => 0,
            AttachMode::Local => self.engine.delete_local_database(self.native.as_ref()),
            AttachMode::Default | AttachMode::Logged => self.engine.delete_database(&self.name),
        };
        if destroy != 0 {
            first_error.get_or_insert(Error::engine("destroy", destroy));
        }

        let leaked = self.open_queries.load(Ordering::Acquire);
        if leaked > 0 {
            warn!(target: "wgbind::db", name = %self.name, leaked, "Detached with unreleased queries");
            first_error.get_or_insert(Error::ResourceNotReleased {
                op: "detach",
                count: leaked,
            });
        }

        info!(
            target: "wgbind::db",
            name = %self.name,
            mode = ?self.mode,
            instance = %self.id,
            destroyed = self.mode.destroys_on_teardown(),
            "Database detached"
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ========== Accessors ==========

    /// Unique id of this instance
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Store name given at attach
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach mode
    pub fn mode(&self) -> AttachMode {
        self.mode
    }

    /// Permission given at attach
    pub fn permission(&self) -> u32 {
        self.permission
    }

    /// Query cursors made and not yet released
    pub fn open_query_count(&self) -> usize {
        self.open_queries.load(Ordering::Acquire)
    }

    /// Records currently tracked by the handle arena
    pub fn live_handles(&self) -> usize {
        self.arena.lock().live()
    }

    pub(crate) fn native(&self) -> &dyn NativeDb {
        self.native.as_ref()
    }

    pub(crate) fn query_opened(&self) {
        self.open_queries.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn query_released(&self) {
        self.open_queries.fetch_sub(1, Ordering::AcqRel);
    }

    // ========== Handles ==========

    /// Register an engine record and return its plain-data reference
    pub(crate) fn register(&self, ptr: RecordPtr) -> RecordRef {
        let (slot, generation) = self.arena.lock().register(ptr);
        RecordRef {
            instance: self.id,
            slot,
            generation,
        }
    }

    /// Engine address behind a reference issued by this instance
    pub(crate) fn resolve(&self, r: RecordRef) -> Result<RecordPtr> {
        if r.instance != self.id {
            return Err(Error::CrossInstanceReference);
        }
        self.arena.lock().resolve(r.slot, r.generation)
    }

    pub(crate) fn wrap(&self, ptr: RecordPtr) -> RecordHandle<'_> {
        RecordHandle::new(self, self.register(ptr))
    }

    /// Turn a [`RecordRef`] (for instance from [`wgbind_core::Value::Record`]) back into a handle
    ///
    /// # Errors
    ///
    /// `CrossInstanceReference` if another instance issued it, `StaleHandle`
    /// if the record has been deleted.
    pub fn record(&self, r: RecordRef) -> Result<RecordHandle<'_>> {
        self.resolve(r)?;
        Ok(RecordHandle::new(self, r))
    }

    /// Create a record with `arity` null fields
    pub fn create(&self, arity: usize) -> Result<RecordHandle<'_>> {
        let ptr = self
            .native
            .create_record(arity)
            .ok_or(Error::engine("create", 0))?;
        Ok(self.wrap(ptr))
    }

    /// Delete an engine record and retire its handle slot
    pub(crate) fn delete_ptr(&self, ptr: RecordPtr) -> Result<()> {
        match self.native.delete_record(ptr) {
            0 => {
                self.arena.lock().invalidate(ptr);
                Ok(())
            }
            STATUS_REFERENCED => Err(Error::ReferencedByOthers {
                code: STATUS_REFERENCED,
            }),
            code => Err(Error::engine("delete", code)),
        }
    }

    /// Forget every handle (the store content was replaced)
    pub(crate) fn invalidate_handles(&self) {
        let mut arena = self.arena.lock();
        let dropped = arena.live();
        arena.invalidate_all();
        debug!(target: "wgbind::db", name = %self.name, dropped, "Record handles invalidated");
    }

    // ========== Stateless walk ==========

    /// First record in engine order
    pub fn first(&self) -> Option<RecordHandle<'_>> {
        self.native.first_record().map(|ptr| self.wrap(ptr))
    }

    /// Record following `handle` in engine order
    pub fn next_after(&self, handle: &RecordHandle<'_>) -> Result<Option<RecordHandle<'_>>> {
        let ptr = handle.ptr()?;
        Ok(self.native.next_record(ptr).map(|next| self.wrap(next)))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("permission", &self.permission)
            .field("open_queries", &self.open_query_count())
            .finish()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(target: "wgbind::db", name = %self.name, error = %e, "Teardown failed during drop");
        }
    }
}
