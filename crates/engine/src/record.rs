//! Record handles
//!
//! A [`RecordHandle`] is a generation-checked reference to one engine
//! record, borrowed from its [`Database`]. Every operation re-resolves the
//! handle through the instance's arena, so a handle to a deleted record
//! fails with `StaleHandle` rather than touching freed engine memory.
//!
//! Field indexes are 1-based here and 0-based at the engine. An index of 0
//! or past the field count is `OutOfRange`.

use std::fmt;

use tracing::debug;

use wgbind_core::{Datum, Error, FieldType, RecordPtr, RecordRef, Result, Value};

use crate::codec;
use crate::cursor::ParentCursor;
use crate::database::Database;

/// Handle to one record of a [`Database`]
#[derive(Clone, Copy)]
pub struct RecordHandle<'db> {
    db: &'db Database,
    slot: u32,
    generation: u32,
}

impl<'db> RecordHandle<'db> {
    pub(crate) fn new(db: &'db Database, r: RecordRef) -> Self {
        Self {
            db,
            slot: r.slot,
            generation: r.generation,
        }
    }

    /// Instance the record belongs to
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Plain-data reference, suitable for storing in a [`Value::Record`]
    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            instance: self.db.id(),
            slot: self.slot,
            generation: self.generation,
        }
    }

    /// This record as a value
    pub fn to_value(&self) -> Value {
        Value::Record(self.record_ref())
    }

    pub(crate) fn ptr(&self) -> Result<RecordPtr> {
        self.db.resolve(self.record_ref())
    }

    /// Number of fields, read from the engine on every call
    pub fn field_count(&self) -> Result<usize> {
        let len = self.db.native().record_len(self.ptr()?);
        if len < 0 {
            return Err(Error::engine("field_count", len));
        }
        Ok(len as usize)
    }

    /// Translate a 1-based index to the engine's 0-based one
    fn position(&self, ptr: RecordPtr, index: usize) -> Result<usize> {
        let len = self.db.native().record_len(ptr);
        if len < 0 {
            return Err(Error::engine("field_count", len));
        }
        let len = len as usize;
        if index == 0 || index > len {
            return Err(Error::OutOfRange { index, len });
        }
        Ok(index - 1)
    }

    // ========== Fields ==========

    /// Read field `index`; `None` when the engine reports an illegal field
    pub fn get(&self, index: usize) -> Result<Option<Value>> {
        let ptr = self.ptr()?;
        let pos = self.position(ptr, index)?;
        Ok(self.read(ptr, pos))
    }

    fn read(&self, ptr: RecordPtr, pos: usize) -> Option<Value> {
        let native = self.db.native();
        let tag = native.field_type(ptr, pos);
        codec::decode(self.db, tag, native.get_field(ptr, pos))
    }

    /// Engine type tag of field `index`; `None` for a tag the binding does not know
    pub fn field_type(&self, index: usize) -> Result<Option<FieldType>> {
        let ptr = self.ptr()?;
        let pos = self.position(ptr, index)?;
        Ok(FieldType::from_raw(self.db.native().field_type(ptr, pos)))
    }

    /// Write field `index`
    pub fn set(&self, index: usize, value: &Value) -> Result<()> {
        let ptr = self.ptr()?;
        let pos = self.position(ptr, index)?;
        let datum = codec::encode(self.db, value)?;
        self.write(ptr, pos, datum)
    }

    fn write(&self, ptr: RecordPtr, pos: usize, datum: Datum) -> Result<()> {
        match self.db.native().set_field(ptr, pos, datum) {
            0 => Ok(()),
            code => Err(Error::engine("set", code)),
        }
    }

    /// All fields in order
    pub fn get_all(&self) -> Result<Vec<Option<Value>>> {
        let ptr = self.ptr()?;
        let len = self.field_count()?;
        Ok((0..len).map(|pos| self.read(ptr, pos)).collect())
    }

    /// Write `values` into fields `1..=min(values.len(), field_count)`
    ///
    /// `Null` entries leave their field untouched. Returns the number of
    /// fields written.
    pub fn set_all(&self, values: &[Value]) -> Result<usize> {
        let ptr = self.ptr()?;
        let len = self.field_count()?;
        let mut written = 0;
        for (pos, value) in values.iter().take(len).enumerate() {
            if value.is_null() {
                continue;
            }
            let datum = codec::encode(self.db, value)?;
            self.write(ptr, pos, datum)?;
            written += 1;
        }
        Ok(written)
    }

    // ========== Structure ==========

    /// Create a record of `arity` fields and link it into field `index`
    ///
    /// Returns the new child. If linking fails the child is deleted again.
    pub fn new_subrecord(&self, index: usize, arity: usize) -> Result<RecordHandle<'db>> {
        let ptr = self.ptr()?;
        let pos = self.position(ptr, index)?;
        let child = self.db.create(arity)?;
        let child_ptr = child.ptr()?;
        if let Err(e) = self.write(ptr, pos, Datum::Record(child_ptr)) {
            self.db.delete_ptr(child_ptr)?;
            return Err(e);
        }
        Ok(child)
    }

    /// Null every record-typed field; returns the number cleared
    pub fn unlink_children(&self) -> Result<usize> {
        let ptr = self.ptr()?;
        let len = self.field_count()?;
        let native = self.db.native();
        let mut cleared = 0;
        for pos in 0..len {
            if native.field_type(ptr, pos) == FieldType::Record.as_raw() {
                self.write(ptr, pos, Datum::Null)?;
                cleared += 1;
            }
        }
        debug!(target: "wgbind::record", slot = self.slot, cleared, "Children unlinked");
        Ok(cleared)
    }

    /// Records holding a reference to this one
    pub fn parents(&self) -> Result<ParentCursor<'db>> {
        Ok(ParentCursor::new(self.db, self.ptr()?))
    }

    /// Delete the record
    ///
    /// # Errors
    ///
    /// `ReferencedByOthers` while other records still point at it (unlink
    /// them and retry); `EngineFatal` for any other engine failure.
    pub fn delete(&self) -> Result<()> {
        self.db.delete_ptr(self.ptr()?)
    }
}

impl PartialEq for RecordHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.record_ref() == other.record_ref()
    }
}

impl Eq for RecordHandle<'_> {}

impl fmt::Debug for RecordHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("instance", &self.db.id())
            .field("slot", &self.slot)
            .field("generation", &self.generation)
            .finish()
    }
}

impl fmt::Display for RecordHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_all() {
            Ok(fields) => {
                let rendered: Vec<String> =
                    fields.iter().map(|v| codec::render(v.as_ref())).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Err(e) => write!(f, "<{}>", e),
        }
    }
}
