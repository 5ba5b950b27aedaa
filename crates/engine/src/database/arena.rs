//! Generation-checked handle arena
//!
//! Every engine record the binding hands out is registered here once and
//! addressed by `(slot, generation)`. Deleting the record bumps the slot's
//! generation, so any [`RecordRef`] still pointing at it resolves to
//! `StaleHandle` instead of reaching engine memory that has been freed.
//!
//! Registration is keyed by engine address, so the same record seen twice
//! (created, then found again by a scan) gets the same slot. A slot stays
//! live until its record is deleted or the store content is replaced
//! (import, clear, detach); the table grows with distinct records seen, not
//! with the number of scans over them.
//!
//! [`RecordRef`]: wgbind_core::RecordRef

use rustc_hash::FxHashMap;

use wgbind_core::{Error, RecordPtr, Result};

#[derive(Debug, Clone, Copy)]
struct Slot {
    ptr: Option<RecordPtr>,
    generation: u32,
}

/// Slot table for one database instance
#[derive(Debug, Default)]
pub(crate) struct HandleArena {
    slots: Vec<Slot>,
    by_ptr: FxHashMap<RecordPtr, u32>,
    free: Vec<u32>,
}

impl HandleArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Slot and generation for `ptr`, allocating a slot on first sight
    pub(crate) fn register(&mut self, ptr: RecordPtr) -> (u32, u32) {
        if let Some(&slot) = self.by_ptr.get(&ptr) {
            return (slot, self.slots[slot as usize].generation);
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].ptr = Some(ptr);
                slot
            }
            None => {
                self.slots.push(Slot {
                    ptr: Some(ptr),
                    generation: 0,
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.by_ptr.insert(ptr, slot);
        (slot, self.slots[slot as usize].generation)
    }

    /// Engine address behind `(slot, generation)`
    pub(crate) fn resolve(&self, slot: u32, generation: u32) -> Result<RecordPtr> {
        match self.slots.get(slot as usize) {
            Some(Slot {
                ptr: Some(ptr),
                generation: current,
            }) if *current == generation => Ok(*ptr),
            _ => Err(Error::StaleHandle { slot, generation }),
        }
    }

    /// Retire the slot of a deleted record
    pub(crate) fn invalidate(&mut self, ptr: RecordPtr) {
        if let Some(slot) = self.by_ptr.remove(&ptr) {
            let entry = &mut self.slots[slot as usize];
            entry.ptr = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(slot);
        }
    }

    /// Retire every slot (the store content was replaced wholesale)
    pub(crate) fn invalidate_all(&mut self) {
        let live: Vec<RecordPtr> = self.by_ptr.keys().copied().collect();
        for ptr in live {
            self.invalidate(ptr);
        }
    }

    /// Number of live slots
    pub(crate) fn live(&self) -> usize {
        self.by_ptr.len()
    }
}
