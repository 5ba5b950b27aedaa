//! Index management
//!
//! Indexes are T-tree indexes on one column, optionally restricted by a
//! multi-value seed list. Creating an index that already exists, creating a
//! multi-value index from an empty list, and dropping a missing index all
//! answer `false` rather than failing.

use smallvec::SmallVec;
use tracing::debug;

use wgbind_core::{Datum, Error, IndexKind, Result, Value};

use super::Database;
use crate::codec;
use crate::cursor::zero_based_column;

impl Database {
    /// Whether a plain index exists on `column` (1-based)
    pub fn has_index(&self, column: usize) -> Result<bool> {
        let col = zero_based_column("has_index", column)?;
        Ok(self.native().column_to_index_id(col, IndexKind::TTree, &[]) >= 0)
    }

    /// Index `column` (1-based); `false` if it is already indexed
    pub fn create_index(&self, column: usize) -> Result<bool> {
        let col = zero_based_column("create_index", column)?;
        self.create_index_with(col, &[])
    }

    /// Index `column` (1-based) restricted to `values`
    ///
    /// `false` for an empty list or an identical existing index.
    pub fn create_multi_index(&self, column: usize, values: &[Value]) -> Result<bool> {
        let col = zero_based_column("create_multi_index", column)?;
        if values.is_empty() {
            return Ok(false);
        }
        let seeds = values
            .iter()
            .map(|v| codec::encode(self, v))
            .collect::<Result<SmallVec<[Datum; 16]>>>()?;
        self.create_index_with(col, &seeds)
    }

    fn create_index_with(&self, col: usize, seeds: &[Datum]) -> Result<bool> {
        let native = self.native();
        if native.column_to_index_id(col, IndexKind::TTree, seeds) >= 0 {
            debug!(target: "wgbind::index", column = col + 1, "Index already exists");
            return Ok(false);
        }
        match native.create_index(col, IndexKind::TTree, seeds) {
            0 => {
                debug!(target: "wgbind::index", column = col + 1, seeds = seeds.len(), "Index created");
                Ok(true)
            }
            code => Err(Error::engine("create_index", code)),
        }
    }

    /// Drop the indexes on `column` (1-based); `false` if there were none
    pub fn drop_index(&self, column: usize) -> Result<bool> {
        let col = zero_based_column("drop_index", column)?;
        match self.native().drop_index(col) {
            0 => {
                debug!(target: "wgbind::index", column, "Index dropped");
                Ok(true)
            }
            -1 => Ok(false),
            code => Err(Error::engine("drop_index", code)),
        }
    }
}
