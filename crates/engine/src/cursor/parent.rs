//! Back-link walk over the parents of one record

use wgbind_core::RecordPtr;

use crate::database::Database;
use crate::record::RecordHandle;

use super::CursorState;

/// Cursor over the records referencing a target record
pub struct ParentCursor<'db> {
    db: &'db Database,
    target: RecordPtr,
    state: CursorState,
}

impl<'db> ParentCursor<'db> {
    pub(crate) fn new(db: &'db Database, target: RecordPtr) -> Self {
        Self {
            db,
            target,
            state: CursorState::NotStarted,
        }
    }

    /// Next parent, `None` forever once the walk is done
    pub fn advance(&mut self) -> Option<RecordHandle<'db>> {
        let native = self.db.native();
        let target = self.target;
        self.state
            .step(
                || native.first_parent(target),
                |parent| native.next_parent(target, parent),
            )
            .map(|ptr| self.db.wrap(ptr))
    }
}

impl<'db> Iterator for ParentCursor<'db> {
    type Item = RecordHandle<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
