//! KvRecord: named fields on top of a fixed-arity record
//!
//! ## Design
//!
//! KvRecord is a stateless facade over one [`RecordHandle`]. It holds no
//! state beyond the handle; all state lives in the engine.
//!
//! ## Slot Layout
//!
//! ```text
//! parent: [ Record ─┐ | Null | Record ─┐ | 42 ]
//!                   ▼                  ▼
//!          ["alpha", 1]        ["beta", "x"]
//! ```
//!
//! Each name lives in a 2-field sub-record `(name, value)` linked from a
//! `Record`-typed field of the parent. New names take the first `Null`
//! field. Fields holding anything else (plain values, records of other
//! shapes) are left alone, so a record can mix positional and named data.
//!
//! ## Complexity
//!
//! `get`, `set`, `remove` are O(arity): one pass over the parent's fields.

use tracing::{debug, warn};

use wgbind_core::{Error, Result, Value};
use wgbind_engine::RecordHandle;

/// Arity of a slot sub-record
pub const SLOT_ARITY: usize = 2;

/// Named-field view over a record
///
/// # Example
///
/// ```ignore
/// let rec = db.create(4)?;
/// let kv = KvRecord::new(rec);
/// kv.set("alpha", &Value::Number(1.0))?;
/// assert_eq!(kv.get("alpha")?, Some(Value::Number(1.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KvRecord<'db> {
    record: RecordHandle<'db>,
}

/// A slot found in the parent
struct Slot<'db> {
    /// 1-based parent field anchoring the slot
    index: usize,
    sub: RecordHandle<'db>,
}

impl<'db> KvRecord<'db> {
    /// Wrap a record
    pub fn new(record: RecordHandle<'db>) -> Self {
        Self { record }
    }

    /// The underlying record
    pub fn record(&self) -> RecordHandle<'db> {
        self.record
    }

    /// Every slot, with its name
    fn slots(&self) -> Result<Vec<(String, Slot<'db>)>> {
        let db = self.record.database();
        let mut out = Vec::new();
        for (pos, field) in self.record.get_all()?.into_iter().enumerate() {
            let Some(Value::Record(r)) = field else {
                continue;
            };
            let sub = match db.record(r) {
                Ok(sub) => sub,
                Err(Error::StaleHandle { .. }) => continue,
                Err(e) => return Err(e),
            };
            if sub.field_count()? != SLOT_ARITY {
                continue;
            }
            if let Some(Value::Text(name)) = sub.get(1)? {
                out.push((name, Slot { index: pos + 1, sub }));
            }
        }
        Ok(out)
    }

    fn find(&self, name: &str) -> Result<Option<Slot<'db>>> {
        Ok(self
            .slots()?
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot))
    }

    /// Value stored under `name`; `None` if the name has no slot
    ///
    /// A slot whose value field is illegal also reads as `None`.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.find(name)? {
            Some(slot) => slot.sub.get(2),
            None => Ok(None),
        }
    }

    /// Whether `name` has a slot
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.find(name)?.is_some())
    }

    /// Store `value` under `name`
    ///
    /// An existing slot is updated in place. Otherwise a new slot is linked
    /// into the first `Null` field.
    ///
    /// # Errors
    ///
    /// `NoFreeSlot` if the name is new and no field is `Null`; the record
    /// is left unchanged.
    pub fn set(&self, name: &str, value: &Value) -> Result<()> {
        if let Some(slot) = self.find(name)? {
            return slot.sub.set(2, value);
        }

        let free = self
            .record
            .get_all()?
            .iter()
            .position(|f| matches!(f, Some(Value::Null)))
            .ok_or_else(|| Error::NoFreeSlot {
                name: name.to_string(),
            })?;

        let sub = self.record.database().create(SLOT_ARITY)?;
        let linked = sub
            .set(1, &Value::from(name))
            .and_then(|_| sub.set(2, value))
            .and_then(|_| self.record.set(free + 1, &sub.to_value()));
        if let Err(e) = linked {
            if let Err(rollback) = self.record.set(free + 1, &Value::Null) {
                warn!(target: "wgbind::kv", name, field = free + 1, error = %rollback, "Slot rollback failed");
            }
            sub.delete()?;
            return Err(e);
        }
        debug!(target: "wgbind::kv", name, field = free + 1, "Slot allocated");
        Ok(())
    }

    /// Remove `name`; `false` if it had no slot
    pub fn remove(&self, name: &str) -> Result<bool> {
        let Some(slot) = self.find(name)? else {
            return Ok(false);
        };
        self.record.set(slot.index, &Value::Null)?;
        match slot.sub.delete() {
            Ok(()) => {}
            // still linked from elsewhere: leave it for its other owners
            Err(e) if e.is_recoverable() => {}
            Err(e) => return Err(e),
        }
        debug!(target: "wgbind::kv", name, field = slot.index, "Slot removed");
        Ok(true)
    }

    /// Names in field order
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.slots()?.into_iter().map(|(n, _)| n).collect())
    }

    /// `(name, value)` pairs in field order
    pub fn entries(&self) -> Result<Vec<(String, Option<Value>)>> {
        self.slots()?
            .into_iter()
            .map(|(name, slot)| Ok((name, slot.sub.get(2)?)))
            .collect()
    }

    /// Number of `Null` fields available for new names
    pub fn free_slots(&self) -> Result<usize> {
        Ok(self
            .record
            .get_all()?
            .iter()
            .filter(|f| matches!(f, Some(Value::Null)))
            .count())
    }
}
