//! wgbind - value-level binding over a positional embedded record store
//!
//! wgbind lets callers work with dynamic [`Value`]s while the engine stores
//! fixed-arity records of typed fields. It provides attach/detach by mode,
//! generation-checked record handles, cursors, queries with aggregation,
//! and a named-field view over records.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wgbind::{AttachMode, Condition, Database, MemoryEngine, QueryBuilder, Value};
//!
//! let engine = Arc::new(MemoryEngine::new());
//! let db = Database::attach(engine, "inventory", 0, AttachMode::Local, 0)?;
//!
//! let rec = db.create(2)?;
//! rec.set(1, &Value::from("bolt"))?;
//! rec.set(2, &Value::Number(12.0))?;
//!
//! let total = db.count(&QueryBuilder::new().term(2, Condition::Greater, 10.0))?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! wgbind (facade)
//!   ├── wgbind-primitives   KvRecord
//!   ├── wgbind-engine       Database, RecordHandle, cursors, queries
//!   ├── wgbind-storage      MemoryEngine (reference engine)
//!   └── wgbind-core         Value, Datum, Error, Engine/NativeDb traits
//! ```
//!
//! The binding only reaches the engine through the `Engine` and `NativeDb`
//! traits; [`MemoryEngine`] is one implementation of them.

pub use wgbind_core::{
    AttachMode, Condition, Datum, Engine, Error, FieldType, InstanceId, LockToken, NativeDb,
    RecordRef, Result, Value,
};
pub use wgbind_engine::{
    codec, AttachConfig, ClearStats, Database, FindCursor, ParentCursor, QueryBuilder,
    QueryCursor, QueryTerm, RecordCursor, RecordHandle, SumUntil, CONFIG_FILE_NAME,
};
pub use wgbind_primitives::KvRecord;
pub use wgbind_storage::{MemoryEngine, DEFAULT_STORE_SIZE, JOURNAL_EXTENSION};
