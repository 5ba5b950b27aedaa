//! Bulk delete of every record in an instance
//!
//! Records are visited in engine order, fetching the successor before the
//! current record is deleted. A record still referenced by others gets one
//! repair pass: every parent field pointing at it is nulled, then the
//! delete is retried once. A second refusal aborts the clear.

use tracing::{debug, info};

use wgbind_core::{Datum, Error, RecordPtr, Result};

use crate::database::Database;

/// Outcome of [`Database::clear`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearStats {
    /// Records deleted
    pub deleted: usize,
    /// Records that needed their incoming references removed first
    pub repaired: usize,
}

impl Database {
    /// Delete every record
    ///
    /// # Errors
    ///
    /// `EngineFatal` if a record cannot be deleted even after its incoming
    /// references were removed, or if the repair itself fails.
    pub fn clear(&self) -> Result<ClearStats> {
        let mut stats = ClearStats::default();
        let native = self.native();
        let mut current = native.first_record();
        while let Some(ptr) = current {
            let next = native.next_record(ptr);
            match self.delete_ptr(ptr) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    let unlinked = self.unlink_parents(ptr)?;
                    debug!(target: "wgbind::db", record = ptr.as_u64(), unlinked, "Incoming references removed");
                    stats.repaired += 1;
                    self.delete_ptr(ptr).map_err(|e| match e {
                        Error::ReferencedByOthers { code } => Error::engine("clear", code),
                        other => other,
                    })?;
                }
                Err(e) => return Err(e),
            }
            stats.deleted += 1;
            current = next;
        }
        info!(
            target: "wgbind::db",
            name = %self.name(),
            deleted = stats.deleted,
            repaired = stats.repaired,
            "Database cleared"
        );
        Ok(stats)
    }

    /// Null every field of every parent that references `target`
    fn unlink_parents(&self, target: RecordPtr) -> Result<usize> {
        let native = self.native();
        let mut cleared = 0;
        let mut parent = native.first_parent(target);
        while let Some(p) = parent {
            let next = native.next_parent(target, p);
            let len = native.record_len(p);
            if len < 0 {
                return Err(Error::engine("clear", len));
            }
            for pos in 0..len as usize {
                if native.get_field(p, pos) == Datum::Record(target) {
                    let status = native.set_field(p, pos, Datum::Null);
                    if status != 0 {
                        return Err(Error::engine("clear", status));
                    }
                    cleared += 1;
                }
            }
            parent = next;
        }
        Ok(cleared)
    }
}
