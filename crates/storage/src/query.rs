//! Lazy conjunctive queries
//!
//! A query is its argument list plus a resume position. Each fetch scans
//! forward from the last returned record, so records created after the
//! query was built are still seen if they sort after the cursor.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use wgbind_core::{Datum, QueryArg};

use crate::store::StoreInner;

/// Total order over encoded values
///
/// Values of different types order by their type tag, so `!=` matches
/// across types and the ordered conditions never do.
pub fn compare_datum(field: &Datum, key: &Datum) -> Ordering {
    match (field, key) {
        (Datum::Int(a), Datum::Int(b)) => a.cmp(b),
        (Datum::Double(a), Datum::Double(b)) => a.total_cmp(b),
        (Datum::Str(a), Datum::Str(b)) => a.cmp(b),
        (Datum::Blob(a), Datum::Blob(b)) => a.cmp(b),
        (Datum::Record(a), Datum::Record(b)) => a.cmp(b),
        (a, b) => a.field_type().as_raw().cmp(&b.field_type().as_raw()),
    }
}

/// Whether `fields` satisfies every argument
pub fn matches_all(fields: &[Datum], args: &[QueryArg]) -> bool {
    args.iter().all(|arg| {
        fields
            .get(arg.column)
            .is_some_and(|f| arg.condition.accepts(compare_datum(f, &arg.datum)))
    })
}

#[derive(Debug)]
struct QueryState {
    args: Vec<QueryArg>,
    last: Option<u64>,
    exhausted: bool,
}

/// Open queries of one store
#[derive(Debug, Default)]
pub struct QueryTable {
    active: FxHashMap<u64, QueryState>,
    next_id: u64,
}

impl QueryTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query and return its id
    pub fn open(&mut self, args: &[QueryArg]) -> u64 {
        self.next_id += 1;
        self.active.insert(
            self.next_id,
            QueryState {
                args: args.to_vec(),
                last: None,
                exhausted: false,
            },
        );
        self.next_id
    }

    /// Release a query; `false` if unknown
    pub fn close(&mut self, id: u64) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Number of queries not yet released
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Check if no query is open
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Advance query `id` over `store`; `None` when exhausted or unknown
pub(crate) fn fetch(store: &mut StoreInner, id: u64) -> Option<u64> {
    let (args, last) = match store.queries.active.get(&id) {
        Some(state) if !state.exhausted => (state.args.clone(), state.last),
        _ => return None,
    };
    let found = store
        .scan_from(last)
        .find(|(_, fields)| matches_all(fields, &args))
        .map(|(rid, _)| *rid);
    if let Some(state) = store.queries.active.get_mut(&id) {
        match found {
            Some(rid) => state.last = Some(rid),
            None => state.exhausted = true,
        }
    }
    found
}
