//! Store: the record table behind every MemoryEngine connection
//!
//! A store keeps:
//! - `BTreeMap<u64, Vec<Datum>>` for records, ordered by allocation id
//!   (that order is the engine's intrinsic record order)
//! - a back-link index child → parents, maintained on every field write, so
//!   parent walks and the "referenced by others" delete check are O(parents)
//! - byte accounting against the capacity requested at attach time
//! - index bookkeeping, open queries, lock state, and the optional journal
//!
//! # Design Notes
//!
//! - **Allocation ids are never reused**: a deleted id stays dead, so a
//!   stale `RecordPtr` can only miss, never alias another record.
//! - **Mutations go through `create`/`set`/`delete`**: the connection layer
//!   journals around these; replay and dump import call them directly.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::PathBuf;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use wgbind_core::{Condition, Datum, RecordPtr};

use crate::index::IndexTable;
use crate::journal::JournalWriter;
use crate::query::{compare_datum, QueryTable};

/// Fixed per-record overhead in bytes (header + back-link anchor)
pub(crate) const RECORD_HEADER_BYTES: u64 = 16;

/// Bytes taken by one encoded field slot
pub(crate) const FIELD_BYTES: u64 = 8;

/// Engine status: success
pub(crate) const STATUS_OK: i64 = 0;
/// Engine status: record is referenced by other records
pub(crate) const STATUS_REFERENCED: i64 = -1;
/// Engine status: bad argument (unknown record, index out of range)
pub(crate) const STATUS_INVALID: i64 = -2;
/// Engine status: store is out of space or otherwise unusable
pub(crate) const STATUS_FATAL: i64 = -3;

/// Lock bookkeeping inside one store
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    readers: Vec<i64>,
    writer: Option<i64>,
    next_token: i64,
}

impl LockTable {
    fn issue(&mut self) -> i64 {
        self.next_token += 1;
        self.next_token
    }

    pub(crate) fn start_read(&mut self) -> i64 {
        if self.writer.is_some() {
            return 0;
        }
        let token = self.issue();
        self.readers.push(token);
        token
    }

    pub(crate) fn end_read(&mut self, token: i64) -> i64 {
        match self.readers.iter().position(|t| *t == token) {
            Some(pos) => {
                self.readers.swap_remove(pos);
                STATUS_OK
            }
            None => STATUS_INVALID,
        }
    }

    pub(crate) fn start_write(&mut self) -> i64 {
        if self.writer.is_some() || !self.readers.is_empty() {
            return 0;
        }
        let token = self.issue();
        self.writer = Some(token);
        token
    }

    pub(crate) fn end_write(&mut self, token: i64) -> i64 {
        if self.writer == Some(token) {
            self.writer = None;
            STATUS_OK
        } else {
            STATUS_INVALID
        }
    }
}

/// Mutable content of a store
#[derive(Debug)]
pub(crate) struct StoreInner {
    pub(crate) records: BTreeMap<u64, Vec<Datum>>,
    /// child id → (parent id → number of fields of that parent referencing it)
    backlinks: FxHashMap<u64, BTreeMap<u64, usize>>,
    pub(crate) next_id: u64,
    used: u64,
    pub(crate) capacity: u64,
    pub(crate) indexes: IndexTable,
    pub(crate) queries: QueryTable,
    pub(crate) locks: LockTable,
    pub(crate) journal: Option<JournalWriter>,
}

fn payload_bytes(datum: &Datum) -> u64 {
    match datum {
        Datum::Str(s) => s.len() as u64,
        Datum::Blob(b) => b.len() as u64,
        _ => 0,
    }
}

fn record_bytes(len: usize) -> u64 {
    RECORD_HEADER_BYTES + FIELD_BYTES * len as u64
}

impl StoreInner {
    pub(crate) fn new(capacity: u64) -> Self {
        Self {
            records: BTreeMap::new(),
            backlinks: FxHashMap::default(),
            next_id: 1,
            used: 0,
            capacity,
            indexes: IndexTable::new(),
            queries: QueryTable::new(),
            locks: LockTable::default(),
            journal: None,
        }
    }

    pub(crate) fn used(&self) -> u64 {
        self.used
    }

    pub(crate) fn free(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }

    // ========== Mutations ==========

    /// Allocate a record of `len` null fields
    pub(crate) fn create(&mut self, len: usize) -> Option<u64> {
        let cost = record_bytes(len);
        if self.used + cost > self.capacity {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, vec![Datum::Null; len]);
        self.used += cost;
        Some(id)
    }

    /// Store `datum` into field `index` of record `id`
    pub(crate) fn set(&mut self, id: u64, index: usize, datum: Datum) -> i64 {
        if matches!(datum, Datum::Illegal) {
            return STATUS_INVALID;
        }
        if let Datum::Record(child) = &datum {
            if !self.records.contains_key(&child.as_u64()) {
                return STATUS_INVALID;
            }
        }
        let new_bytes = payload_bytes(&datum);
        let old = match self.records.get(&id).and_then(|fields| fields.get(index)) {
            Some(old) => old.clone(),
            None => return STATUS_INVALID,
        };
        let old_bytes = payload_bytes(&old);
        if self.used - old_bytes + new_bytes > self.capacity {
            return STATUS_FATAL;
        }

        if let Datum::Record(old_child) = old {
            self.unlink(old_child.as_u64(), id);
        }
        if let Datum::Record(new_child) = &datum {
            *self
                .backlinks
                .entry(new_child.as_u64())
                .or_default()
                .entry(id)
                .or_insert(0) += 1;
        }
        if let Some(slot) = self.records.get_mut(&id).and_then(|f| f.get_mut(index)) {
            *slot = datum;
        }
        self.used = self.used - old_bytes + new_bytes;
        STATUS_OK
    }

    /// Delete record `id` unless another record still references it
    pub(crate) fn delete(&mut self, id: u64) -> i64 {
        if !self.records.contains_key(&id) {
            return STATUS_INVALID;
        }
        if self.backlinks.get(&id).is_some_and(|p| !p.is_empty()) {
            return STATUS_REFERENCED;
        }
        let fields = match self.records.remove(&id) {
            Some(fields) => fields,
            None => return STATUS_INVALID,
        };
        let mut freed = record_bytes(fields.len());
        for datum in &fields {
            freed += payload_bytes(datum);
            if let Datum::Record(child) = datum {
                self.unlink(child.as_u64(), id);
            }
        }
        self.backlinks.remove(&id);
        self.used = self.used.saturating_sub(freed);
        STATUS_OK
    }

    fn unlink(&mut self, child: u64, parent: u64) {
        if let Some(parents) = self.backlinks.get_mut(&child) {
            if let Some(count) = parents.get_mut(&parent) {
                *count -= 1;
                if *count == 0 {
                    parents.remove(&parent);
                }
            }
            if parents.is_empty() {
                self.backlinks.remove(&child);
            }
        }
    }

    /// Drop every record and rebuild from `records`
    ///
    /// The allocation counter only moves forward, so ids handed out before
    /// the rebuild stay dead.
    pub(crate) fn replace_records(&mut self, records: BTreeMap<u64, Vec<Datum>>, next_id: u64) {
        self.records = BTreeMap::new();
        self.backlinks = FxHashMap::default();
        self.used = 0;
        self.next_id = self.next_id.max(next_id);
        for (id, fields) in records {
            self.used += record_bytes(fields.len());
            for datum in &fields {
                self.used += payload_bytes(datum);
                if let Datum::Record(child) = datum {
                    *self
                        .backlinks
                        .entry(child.as_u64())
                        .or_default()
                        .entry(id)
                        .or_insert(0) += 1;
                }
            }
            self.records.insert(id, fields);
        }
    }

    /// Remove all content (local store destruction)
    pub(crate) fn wipe(&mut self) {
        self.replace_records(BTreeMap::new(), self.next_id);
        self.indexes = IndexTable::new();
        self.queries = QueryTable::new();
        self.locks = LockTable::default();
        self.journal = None;
    }

    // ========== Navigation ==========

    pub(crate) fn first(&self) -> Option<u64> {
        self.records.keys().next().copied()
    }

    pub(crate) fn next_after(&self, id: u64) -> Option<u64> {
        self.records
            .range((Bound::Excluded(id), Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    pub(crate) fn first_parent(&self, child: u64) -> Option<u64> {
        self.backlinks
            .get(&child)
            .and_then(|parents| parents.keys().next().copied())
    }

    pub(crate) fn next_parent(&self, child: u64, parent: u64) -> Option<u64> {
        self.backlinks.get(&child).and_then(|parents| {
            parents
                .range((Bound::Excluded(parent), Bound::Unbounded))
                .next()
                .map(|(k, _)| *k)
        })
    }

    pub(crate) fn field(&self, id: u64, index: usize) -> Option<&Datum> {
        self.records.get(&id).and_then(|fields| fields.get(index))
    }

    /// Records after `after` (or from the start) in engine order
    pub(crate) fn scan_from(
        &self,
        after: Option<u64>,
    ) -> impl Iterator<Item = (&u64, &Vec<Datum>)> + '_ {
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        self.records.range((lower, Bound::Unbounded))
    }

    /// Next record after `after` whose field `column` satisfies `cond` against `key`
    pub(crate) fn find(
        &self,
        column: usize,
        cond: Condition,
        key: &Datum,
        after: Option<RecordPtr>,
    ) -> Option<u64> {
        self.scan_from(after.map(RecordPtr::as_u64))
            .find(|(_, fields)| {
                fields
                    .get(column)
                    .is_some_and(|field| cond.accepts(compare_datum(field, key)))
            })
            .map(|(id, _)| *id)
    }
}

/// One engine store, shared by every connection attached to it
#[derive(Debug)]
pub(crate) struct Store {
    pub(crate) id: u64,
    pub(crate) name: Option<String>,
    pub(crate) permissions: u32,
    pub(crate) log_path: PathBuf,
    pub(crate) inner: RwLock<StoreInner>,
}

impl Store {
    pub(crate) fn new(
        id: u64,
        name: Option<String>,
        capacity: u64,
        permissions: u32,
        log_path: PathBuf,
    ) -> Self {
        Self {
            id,
            name,
            permissions,
            log_path,
            inner: RwLock::new(StoreInner::new(capacity)),
        }
    }

    /// Label used in logs and journal file names
    pub(crate) fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("local-{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner() -> StoreInner {
        StoreInner::new(1_000_000)
    }

    #[test]
    fn test_create_and_order() {
        let mut s = inner();
        let a = s.create(2).unwrap();
        let b = s.create(3).unwrap();
        assert!(a < b);
        assert_eq!(s.first(), Some(a));
        assert_eq!(s.next_after(a), Some(b));
        assert_eq!(s.next_after(b), None);
    }

    #[test]
    fn test_delete_blocked_by_reference() {
        let mut s = inner();
        let parent = s.create(1).unwrap();
        let child = s.create(1).unwrap();
        assert_eq!(s.set(parent, 0, Datum::Record(RecordPtr::new(child))), STATUS_OK);
        assert_eq!(s.delete(child), STATUS_REFERENCED);
        assert_eq!(s.first_parent(child), Some(parent));

        assert_eq!(s.set(parent, 0, Datum::Null), STATUS_OK);
        assert_eq!(s.first_parent(child), None);
        assert_eq!(s.delete(child), STATUS_OK);
    }

    #[test]
    fn test_deleting_parent_releases_backlinks() {
        let mut s = inner();
        let parent = s.create(2).unwrap();
        let child = s.create(1).unwrap();
        s.set(parent, 0, Datum::Record(RecordPtr::new(child)));
        s.set(parent, 1, Datum::Record(RecordPtr::new(child)));
        assert_eq!(s.delete(parent), STATUS_OK);
        assert_eq!(s.delete(child), STATUS_OK);
    }

    #[test]
    fn test_multiple_parents_in_order() {
        let mut s = inner();
        let child = s.create(1).unwrap();
        let p1 = s.create(1).unwrap();
        let p2 = s.create(1).unwrap();
        s.set(p2, 0, Datum::Record(RecordPtr::new(child)));
        s.set(p1, 0, Datum::Record(RecordPtr::new(child)));
        assert_eq!(s.first_parent(child), Some(p1));
        assert_eq!(s.next_parent(child, p1), Some(p2));
        assert_eq!(s.next_parent(child, p2), None);
    }

    #[test]
    fn test_capacity_enforced() {
        let mut s = StoreInner::new(record_bytes(2));
        assert!(s.create(2).is_some());
        assert!(s.create(1).is_none());
    }

    #[test]
    fn test_set_rejects_bad_targets() {
        let mut s = inner();
        let r = s.create(1).unwrap();
        assert_eq!(s.set(r, 1, Datum::Int(1)), STATUS_INVALID);
        assert_eq!(s.set(r, 0, Datum::Record(RecordPtr::new(999))), STATUS_INVALID);
        assert_eq!(s.set(r, 0, Datum::Illegal), STATUS_INVALID);
        assert_eq!(s.set(999, 0, Datum::Int(1)), STATUS_INVALID);
    }

    #[test]
    fn test_used_bytes_track_payloads() {
        let mut s = inner();
        let r = s.create(1).unwrap();
        let base = s.used();
        s.set(r, 0, Datum::Str("hello".into()));
        assert_eq!(s.used(), base + 5);
        s.set(r, 0, Datum::Null);
        assert_eq!(s.used(), base);
    }

    #[test]
    fn test_lock_table() {
        let mut locks = LockTable::default();
        let r = locks.start_read();
        assert_ne!(r, 0);
        assert_eq!(locks.start_write(), 0);
        assert_eq!(locks.end_read(r), STATUS_OK);
        let w = locks.start_write();
        assert_ne!(w, 0);
        assert_eq!(locks.start_read(), 0);
        assert_eq!(locks.end_write(w + 1), STATUS_INVALID);
        assert_eq!(locks.end_write(w), STATUS_OK);
    }
}
