//! Index bookkeeping for MemoryEngine stores
//!
//! The reference engine answers every search by scanning, so an index here
//! is a registration only: `(column, kind, multi-value seed list)` plus the
//! id the engine assigned. That is enough to exercise the binding's
//! duplicate/missing index logic.

use wgbind_core::{Datum, IndexKind};

/// A registered index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Engine-assigned id
    pub id: i64,
    /// 0-based column
    pub column: usize,
    /// Physical structure
    pub kind: IndexKind,
    /// Multi-value seed list, empty for a single-column index
    pub matches: Vec<Datum>,
}

/// All indexes of one store
#[derive(Debug, Default)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
    next_id: i64,
}

impl IndexTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the matching index, `-1` if none
    pub fn lookup(&self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64 {
        self.entries
            .iter()
            .find(|e| e.column == column && e.kind == kind && e.matches == matches)
            .map_or(-1, |e| e.id)
    }

    /// Register an index; `-1` if an identical one exists
    pub fn create(&mut self, column: usize, kind: IndexKind, matches: &[Datum]) -> i64 {
        if self.lookup(column, kind, matches) >= 0 {
            return -1;
        }
        self.next_id += 1;
        self.entries.push(IndexEntry {
            id: self.next_id,
            column,
            kind,
            matches: matches.to_vec(),
        });
        0
    }

    /// Remove every index on `column`; `-1` if there was none
    pub fn drop_column(&mut self, column: usize) -> i64 {
        let before = self.entries.len();
        self.entries.retain(|e| e.column != column);
        if self.entries.len() == before {
            -1
        } else {
            0
        }
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no index is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
