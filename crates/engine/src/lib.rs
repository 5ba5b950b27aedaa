//! Binding layer for wgbind
//!
//! This crate sits between dynamic values and the engine seam:
//! - Database: attach/detach by mode, handle arena, lock bookkeeping
//! - RecordHandle: generation-checked record access with 1-based fields
//! - Codec: Value ⇄ Datum translation driven by engine field tags
//! - Cursors: sequential scan, parent walk, predicate find
//! - Queries: builder (incl. JSON form), cursor, count/sum aggregation
//! - Bulk clear with back-reference repair
//!
//! The crate only talks to the engine through `wgbind_core::{Engine, NativeDb}`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clear;
pub mod codec;
pub mod cursor;
pub mod database;
pub mod query;
pub mod record;

pub use clear::ClearStats;
pub use cursor::{FindCursor, ParentCursor, RecordCursor};
pub use database::config::CONFIG_FILE_NAME;
pub use database::{AttachConfig, Database};
pub use query::{QueryBuilder, QueryCursor, QueryTerm, SumUntil};
pub use record::RecordHandle;
