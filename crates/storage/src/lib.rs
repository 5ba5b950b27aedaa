//! Storage layer for wgbind
//!
//! This crate implements `MemoryEngine`, an in-process engine behind the
//! `Engine`/`NativeDb` seam:
//! - Named shared stores in a per-engine registry, plus private local stores
//! - BTreeMap record table with back-link tracking for parent walks
//! - Byte accounting against the attach-time capacity
//! - Read/write lock tokens
//! - Index bookkeeping and lazy conjunctive queries
//! - Mutation journal with CRC-framed entries, binary dumps, CSV import/export
//!
//! The binding in `wgbind-engine` works against any engine; this one exists
//! so the binding can be run and tested without a native library.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::atomic::{AtomicU64, Ordering};

pub mod connection;
pub mod engine;
pub mod index;
pub mod journal;
pub mod query;

mod csv_io;
mod dump;
mod store;

pub use connection::MemoryDb;
pub use engine::{MemoryEngine, DEFAULT_STORE_SIZE, JOURNAL_EXTENSION};
pub use journal::{JournalEntry, JournalWriter};

/// Counters shared by an engine and all of its connections
#[derive(Debug, Default)]
pub struct EngineStats {
    calls: AtomicU64,
    open_queries: AtomicU64,
}

impl EngineStats {
    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn query_opened(&self) {
        self.open_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn query_closed(&self) {
        self.open_queries.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn queries_dropped(&self, count: u64) {
        self.open_queries.fetch_sub(count, Ordering::Relaxed);
    }

    /// Total trait calls
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Queries made and not yet freed
    pub fn open_queries(&self) -> u64 {
        self.open_queries.load(Ordering::Relaxed)
    }
}
