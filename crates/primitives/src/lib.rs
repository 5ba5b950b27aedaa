//! Primitives layer for wgbind
//!
//! Higher-level views built purely on the public `wgbind-engine` API:
//! - KvRecord: named fields stored in `(name, value)` sub-records

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{KvRecord, SLOT_ARITY};
