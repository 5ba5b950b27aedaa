//! Sequential scan in engine record order

use crate::database::Database;
use crate::record::RecordHandle;

use super::CursorState;

/// Cursor over every record of an instance
pub struct RecordCursor<'db> {
    db: &'db Database,
    state: CursorState,
}

impl<'db> RecordCursor<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            state: CursorState::NotStarted,
        }
    }

    /// Next record, `None` forever once the scan is done
    pub fn advance(&mut self) -> Option<RecordHandle<'db>> {
        let native = self.db.native();
        self.state
            .step(|| native.first_record(), |cur| native.next_record(cur))
            .map(|ptr| self.db.wrap(ptr))
    }
}

impl<'db> Iterator for RecordCursor<'db> {
    type Item = RecordHandle<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl Database {
    /// Scan all records in engine order
    pub fn records(&self) -> RecordCursor<'_> {
        RecordCursor::new(self)
    }
}
