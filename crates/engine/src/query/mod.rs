//! Multi-condition queries
//!
//! A [`QueryCursor`] owns one engine query allocation. The allocation is
//! released exactly once:
//! - when a fetch reports exhaustion,
//! - on [`QueryCursor::release`], or
//! - on drop (with a warning, since the caller abandoned the cursor).
//!
//! The instance counts cursors that are still holding an allocation; a
//! cursor leaked with `mem::forget` shows up as `ResourceNotReleased` at
//! detach.

mod aggregate;
mod builder;

pub use aggregate::SumUntil;
pub use builder::{QueryArgs, QueryBuilder, QueryTerm, INLINE_ARGS};

use tracing::{debug, warn};

use wgbind_core::{Error, QueryId, RecordPtr, Result};

use crate::database::Database;
use crate::record::RecordHandle;

/// Cursor over the records matching a query
pub struct QueryCursor<'db> {
    db: &'db Database,
    query: Option<QueryId>,
}

impl<'db> QueryCursor<'db> {
    /// Next matching engine record without registering a handle
    pub(crate) fn next_ptr(&mut self) -> Option<RecordPtr> {
        let query = self.query?;
        match self.db.native().fetch(query) {
            Some(ptr) => Some(ptr),
            None => {
                if let Err(e) = self.release() {
                    warn!(target: "wgbind::query", error = %e, "Query release after exhaustion failed");
                }
                None
            }
        }
    }

    /// Next match, `None` forever once exhausted or released
    pub fn advance(&mut self) -> Option<RecordHandle<'db>> {
        self.next_ptr().map(|ptr| self.db.wrap(ptr))
    }

    /// Whether the cursor still holds an engine query
    pub fn is_open(&self) -> bool {
        self.query.is_some()
    }

    /// Release the engine query now; later calls are no-ops
    ///
    /// # Errors
    ///
    /// `ResourceNotReleased` if the engine refuses to free the query. The
    /// instance keeps counting it, so detach reports it too.
    pub fn release(&mut self) -> Result<()> {
        let Some(query) = self.query.take() else {
            return Ok(());
        };
        let status = self.db.native().free_query(query);
        if status != 0 {
            return Err(Error::ResourceNotReleased {
                op: "free_query",
                count: 1,
            });
        }
        self.db.query_released();
        debug!(target: "wgbind::query", query = query.as_u64(), "Query released");
        Ok(())
    }
}

impl<'db> Iterator for QueryCursor<'db> {
    type Item = RecordHandle<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl Drop for QueryCursor<'_> {
    fn drop(&mut self) {
        if self.query.is_some() {
            warn!(target: "wgbind::query", db = %self.db.name(), "Query cursor dropped before exhaustion");
            if let Err(e) = self.release() {
                warn!(target: "wgbind::query", error = %e, "Query release on drop failed");
            }
        }
    }
}

impl Database {
    /// Run a query
    ///
    /// A builder with no terms matches every record.
    ///
    /// # Errors
    ///
    /// Builder errors (see [`QueryBuilder::build`]); `EngineFatal` if the
    /// engine cannot allocate the query.
    pub fn query(&self, builder: &QueryBuilder) -> Result<QueryCursor<'_>> {
        let args = builder.build(self)?;
        let query = self
            .native()
            .make_query(&args)
            .ok_or(Error::engine("query", 0))?;
        self.query_opened();
        debug!(
            target: "wgbind::query",
            db = %self.name(),
            query = query.as_u64(),
            args = args.len(),
            "Query built"
        );
        Ok(QueryCursor {
            db: self,
            query: Some(query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wgbind_core::{AttachMode, Condition, Value};
    use wgbind_storage::MemoryEngine;

    fn seeded(engine: &Arc<MemoryEngine>) -> Database {
        let db = Database::attach(engine.clone(), "query", 0, AttachMode::Local, 0).unwrap();
        for n in [4.0, 10.0, 6.0, 1.0] {
            db.create(2).unwrap().set(1, &Value::Number(n)).unwrap();
        }
        db
    }

    #[test]
    fn test_query_yields_matches_and_releases() {
        let engine = Arc::new(MemoryEngine::new());
        let db = seeded(&engine);
        let q = QueryBuilder::new().term(1, Condition::GreaterOrEqual, 5.0);
        let mut cursor = db.query(&q).unwrap();
        assert_eq!(db.open_query_count(), 1);
        let values: Vec<_> = cursor.by_ref().map(|r| r.get(1).unwrap()).collect();
        assert_eq!(values, vec![Some(Value::Number(10.0)), Some(Value::Number(6.0))]);
        assert!(!cursor.is_open());
        assert_eq!(db.open_query_count(), 0);
        assert_eq!(engine.open_query_count(), 0);

        let calls = engine.call_count();
        assert!(cursor.advance().is_none());
        assert_eq!(engine.call_count(), calls);
    }

    #[test]
    fn test_explicit_release_is_idempotent() {
        let engine = Arc::new(MemoryEngine::new());
        let db = seeded(&engine);
        let mut cursor = db.query(&QueryBuilder::new()).unwrap();
        assert!(cursor.advance().is_some());
        cursor.release().unwrap();
        cursor.release().unwrap();
        assert!(cursor.advance().is_none());
        assert_eq!(engine.open_query_count(), 0);
    }

    #[test]
    fn test_drop_releases() {
        let engine = Arc::new(MemoryEngine::new());
        let db = seeded(&engine);
        {
            let mut cursor = db.query(&QueryBuilder::new()).unwrap();
            cursor.advance();
        }
        assert_eq!(db.open_query_count(), 0);
        assert_eq!(engine.open_query_count(), 0);
    }

    #[test]
    fn test_forgotten_cursor_reported_at_detach() {
        let engine = Arc::new(MemoryEngine::new());
        let db = seeded(&engine);
        let cursor = db.query(&QueryBuilder::new()).unwrap();
        std::mem::forget(cursor);
        assert!(matches!(
            db.detach(),
            Err(Error::ResourceNotReleased { op: "detach", count: 1 })
        ));
        assert_eq!(engine.live_local_stores(), 0);
    }
}
