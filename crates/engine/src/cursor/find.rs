//! Predicate search on one column
//!
//! The key's kind picks the engine's typed search primitive:
//!
//! | Key | Primitive |
//! |-----|-----------|
//! | `Number` | `find_record_double` |
//! | `Text` | `find_record_str` |
//! | `Bool` | `find_record_int` (0/1) |
//! | `Null` | `find_record_null` |
//! | `Blob`, `Record` | none, the cursor is empty |
//!
//! Each advance resumes the search after the previous match.

use wgbind_core::{Condition, Error, RecordPtr, Result, Value};

use crate::database::Database;
use crate::record::RecordHandle;

use super::CursorState;

#[derive(Debug, Clone, PartialEq)]
enum FindKey {
    Double(f64),
    Str(String),
    Int(i64),
    Null,
    Unsupported,
}

impl From<&Value> for FindKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => FindKey::Double(*n),
            Value::Text(s) => FindKey::Str(s.clone()),
            Value::Bool(b) => FindKey::Int(i64::from(*b)),
            Value::Null => FindKey::Null,
            Value::Blob(_) | Value::Record(_) => FindKey::Unsupported,
        }
    }
}

/// Cursor over records whose field `column` satisfies a condition
pub struct FindCursor<'db> {
    db: &'db Database,
    column: usize,
    condition: Condition,
    key: FindKey,
    state: CursorState,
}

impl<'db> FindCursor<'db> {
    fn search(&self, after: Option<RecordPtr>) -> Option<RecordPtr> {
        let native = self.db.native();
        match &self.key {
            FindKey::Double(d) => native.find_record_double(self.column, self.condition, *d, after),
            FindKey::Str(s) => native.find_record_str(self.column, self.condition, s, after),
            FindKey::Int(i) => native.find_record_int(self.column, self.condition, *i, after),
            FindKey::Null => native.find_record_null(self.column, self.condition, after),
            FindKey::Unsupported => None,
        }
    }

    /// Next match, `None` forever once the search is done
    pub fn advance(&mut self) -> Option<RecordHandle<'db>> {
        if self.key == FindKey::Unsupported {
            self.state = CursorState::Exhausted;
            return None;
        }
        let mut state = self.state;
        let found = state.step(|| self.search(None), |cur| self.search(Some(cur)));
        self.state = state;
        found.map(|ptr| self.db.wrap(ptr))
    }
}

impl<'db> Iterator for FindCursor<'db> {
    type Item = RecordHandle<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

/// Validate a 1-based column and return it 0-based
pub(crate) fn zero_based_column(op: &str, column: usize) -> Result<usize> {
    column
        .checked_sub(1)
        .ok_or_else(|| Error::config(format!("{}: columns are numbered from 1", op)))
}

impl Database {
    /// Search field `column` (1-based) for values satisfying `condition` against `key`
    ///
    /// # Errors
    ///
    /// `Configuration` for column 0.
    pub fn find(&self, column: usize, condition: Condition, key: &Value) -> Result<FindCursor<'_>> {
        Ok(FindCursor {
            db: self,
            column: zero_based_column("find", column)?,
            condition,
            key: FindKey::from(key),
            state: CursorState::NotStarted,
        })
    }

    /// First record matching [`Database::find`]
    pub fn find_one(
        &self,
        column: usize,
        condition: Condition,
        key: &Value,
    ) -> Result<Option<RecordHandle<'_>>> {
        Ok(self.find(column, condition, key)?.advance())
    }
}
