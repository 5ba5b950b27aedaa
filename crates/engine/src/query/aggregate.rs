//! Count and sum aggregation over a query
//!
//! Aggregations drive a [`QueryCursor`](super::QueryCursor) internally and
//! read fields straight from the engine. `count` and `count_and_sum` do not
//! register a handle per matched record; `sum_until` hands back the records
//! it consumed.
//!
//! Only `Int` and `Double` fields contribute to sums; anything else
//! (including a column past the end of the record) contributes 0.
//! An empty condition list aggregates to zero without building a query.

use tracing::debug;

use wgbind_core::{RecordPtr, Result};

use crate::cursor::zero_based_column;
use crate::database::Database;
use crate::record::RecordHandle;

use super::QueryBuilder;

/// Result of [`Database::sum_until`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SumUntil<'db> {
    /// Records consumed in fetch order, including the one that reached the limit
    pub records: Vec<RecordHandle<'db>>,
    /// Running sum at the stop point
    pub sum: f64,
}

impl<'db> SumUntil<'db> {
    /// Number of consumed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumed record at 1-based `index`
    pub fn record(&self, index: usize) -> Option<RecordHandle<'db>> {
        index
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .copied()
    }
}

impl Database {
    fn contribution(&self, ptr: RecordPtr, column: usize) -> f64 {
        self.native()
            .get_field(ptr, column)
            .as_number()
            .unwrap_or(0.0)
    }

    /// Number of records matching `builder`
    pub fn count(&self, builder: &QueryBuilder) -> Result<usize> {
        if builder.is_empty() {
            return Ok(0);
        }
        let mut cursor = self.query(builder)?;
        let mut count = 0;
        while cursor.next_ptr().is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Matching record count and the sum of field `column` (1-based) over them
    pub fn count_and_sum(&self, builder: &QueryBuilder, column: usize) -> Result<(usize, f64)> {
        let column = zero_based_column("count_and_sum", column)?;
        if builder.is_empty() {
            return Ok((0, 0.0));
        }
        let mut cursor = self.query(builder)?;
        let mut count = 0;
        let mut sum = 0.0;
        while let Some(ptr) = cursor.next_ptr() {
            count += 1;
            sum += self.contribution(ptr, column);
        }
        Ok((count, sum))
    }

    /// Sum field `column` (1-based) over matches until the running sum reaches `limit`
    ///
    /// The record whose contribution reaches the limit is included. `None`
    /// or `Some(0.0)` means no limit: every match is consumed. On an early
    /// stop the engine query is released immediately.
    pub fn sum_until(
        &self,
        builder: &QueryBuilder,
        column: usize,
        limit: Option<f64>,
    ) -> Result<SumUntil<'_>> {
        let column = zero_based_column("sum_until", column)?;
        let limit = limit.filter(|l| *l != 0.0);
        let mut out = SumUntil::default();
        if builder.is_empty() {
            return Ok(out);
        }
        let mut cursor = self.query(builder)?;
        while let Some(ptr) = cursor.next_ptr() {
            out.sum += self.contribution(ptr, column);
            out.records.push(self.wrap(ptr));
            if let Some(limit) = limit {
                if out.sum >= limit {
                    debug!(target: "wgbind::query", records = out.len(), sum = out.sum, limit, "Sum limit reached");
                    cursor.release()?;
                    break;
                }
            }
        }
        Ok(out)
    }
}
