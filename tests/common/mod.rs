//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

pub use wgbind::{
    AttachConfig, AttachMode, Condition, Database, Error, FieldType, KvRecord, MemoryEngine,
    QueryBuilder, QueryTerm, RecordHandle, Value,
};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique store name so parallel tests never share a named store
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, COUNTER.fetch_add(1, Ordering::Relaxed))
}

// ============================================================================
// TestDb - engine + instance + scratch directory
// ============================================================================

/// Test database wrapper
///
/// Journals land in `dir`, which is removed when the wrapper drops.
pub struct TestDb {
    pub engine: Arc<MemoryEngine>,
    pub dir: TempDir,
    pub db: Database,
}

impl TestDb {
    /// Local (private, destroyed on teardown) instance
    pub fn new() -> Self {
        Self::with_mode(AttachMode::Local)
    }

    /// Instance attached in `mode` under a fresh name
    pub fn with_mode(mode: AttachMode) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let engine = Arc::new(MemoryEngine::with_log_dir(dir.path()));
        let db = Database::attach(engine.clone(), &unique_name("test"), 0, mode, 0)
            .expect("Failed to attach test database");
        TestDb { engine, dir, db }
    }

    /// Second instance on the same named store, attached as `Existing`
    pub fn attach_existing(&self) -> Database {
        Database::attach(
            self.engine.clone(),
            self.db.name(),
            0,
            AttachMode::Existing,
            0,
        )
        .expect("Failed to attach existing store")
    }

    /// Path inside the scratch directory
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    /// Create a record holding `values`, one per field
    pub fn row(&self, values: &[Value]) -> RecordHandle<'_> {
        let rec = self.db.create(values.len()).expect("create failed");
        rec.set_all(values).expect("set_all failed");
        rec
    }

    /// Number of records in the store
    pub fn record_count(&self) -> usize {
        self.db.records().count()
    }
}

/// Shorthand for a number value
pub fn num(n: f64) -> Value {
    Value::Number(n)
}
