//! Query construction
//!
//! A query is a list of condition groups; each group is a list of
//! [`QueryTerm`]s. Groups only exist for the caller's convenience: the
//! builder flattens them in order into one native argument array, and the
//! engine ANDs every argument.
//!
//! ## JSON form
//!
//! ```json
//! [
//!   [ {"column": 1, "cond": ">", "value": 10}, {"column": 2, "cond": "=", "value": "x"} ],
//!   {"column": 3, "cond": "!=", "value": null}
//! ]
//! ```
//!
//! Array entries are groups, object entries are single-term groups, and any
//! other entry is skipped. A missing `value` means null.

use smallvec::SmallVec;
use tracing::warn;

use wgbind_core::{Condition, Error, QueryArg, Result, Value};

use crate::codec;
use crate::cursor::zero_based_column;
use crate::database::Database;

/// Inline capacity of a built argument array
pub const INLINE_ARGS: usize = 8;

/// Native argument array produced by [`QueryBuilder::build`]
pub type QueryArgs = SmallVec<[QueryArg; INLINE_ARGS]>;

/// One condition: `field[column] <condition> value`, column 1-based
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerm {
    /// 1-based field position
    pub column: usize,
    /// Comparison operator
    pub condition: Condition,
    /// Comparison value
    pub value: Value,
}

impl QueryTerm {
    /// Create a term
    pub fn new(column: usize, condition: Condition, value: impl Into<Value>) -> Self {
        Self {
            column,
            condition,
            value: value.into(),
        }
    }

    fn from_json(term: &serde_json::Value) -> Result<Self> {
        let obj = term
            .as_object()
            .ok_or_else(|| Error::config(format!("query term must be an object, got {}", term)))?;

        let column = obj
            .get("column")
            .and_then(serde_json::Value::as_u64)
            .filter(|c| *c > 0)
            .ok_or_else(|| Error::config("query term needs a positive integer 'column'"))?;

        let condition: Condition = obj
            .get("cond")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::config("query term needs a string 'cond'"))?
            .parse()?;

        let value = match obj.get("value") {
            None | Some(serde_json::Value::Null) => Value::Null,
            Some(serde_json::Value::Bool(b)) => Value::Bool(*b),
            Some(serde_json::Value::Number(n)) => Value::Number(
                n.as_f64()
                    .ok_or_else(|| Error::config(format!("query value {} is not representable", n)))?,
            ),
            Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
            Some(other) => {
                return Err(Error::config(format!(
                    "query value must be a scalar, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            column: column as usize,
            condition,
            value,
        })
    }
}

/// Ordered list of condition groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    groups: Vec<Vec<QueryTerm>>,
}

impl QueryBuilder {
    /// Create an empty builder (an empty query matches nothing in aggregations)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group of terms
    pub fn group(mut self, terms: impl IntoIterator<Item = QueryTerm>) -> Self {
        self.groups.push(terms.into_iter().collect());
        self
    }

    /// Append a single-term group
    pub fn term(self, column: usize, condition: Condition, value: impl Into<Value>) -> Self {
        self.group([QueryTerm::new(column, condition, value)])
    }

    /// Parse the JSON form
    ///
    /// # Errors
    ///
    /// `Configuration` if the top level is not an array or a term inside a
    /// group is malformed.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let entries = json
            .as_array()
            .ok_or_else(|| Error::config("query must be a JSON array"))?;
        let mut builder = Self::new();
        for (position, entry) in entries.iter().enumerate() {
            match entry {
                serde_json::Value::Array(terms) => {
                    let group = terms
                        .iter()
                        .map(QueryTerm::from_json)
                        .collect::<Result<Vec<_>>>()?;
                    builder.groups.push(group);
                }
                serde_json::Value::Object(_) => {
                    builder.groups.push(vec![QueryTerm::from_json(entry)?]);
                }
                other => {
                    warn!(target: "wgbind::query", position, entry = %other, "Query entry discarded");
                }
            }
        }
        Ok(builder)
    }

    /// Parse the JSON form from text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::config(format!("query is not valid JSON: {}", e)))?;
        Self::from_json(&json)
    }

    /// All terms in flattening order
    pub fn terms(&self) -> impl Iterator<Item = &QueryTerm> {
        self.groups.iter().flatten()
    }

    /// Total number of terms
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Check if there are no terms
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the engine's argument array, encoding values for `db`
    ///
    /// # Errors
    ///
    /// `Configuration` for column 0; codec errors for record values from
    /// another instance or stale records.
    pub fn build(&self, db: &Database) -> Result<QueryArgs> {
        self.terms()
            .map(|term| {
                Ok(QueryArg {
                    column: zero_based_column("query", term.column)?,
                    condition: term.condition,
                    datum: codec::encode(db, &term.value)?,
                })
            })
            .collect()
    }
}
