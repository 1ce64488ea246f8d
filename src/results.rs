mod record;

pub use record::{Columns, Record};

use crate::driver::StatementOutput;
use crate::error::PoolError;
use crate::types::Value;

/// Outcome of one pool call.
///
/// Failures are carried as data: a call succeeded iff [`QueryResult::error`] is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    records: Vec<Record>,
    last_insert_id: Option<Value>,
    rows_affected: i64,
    error: Option<PoolError>,
}

impl QueryResult {
    pub(crate) fn from_output(output: StatementOutput) -> Self {
        let StatementOutput {
            columns,
            rows,
            last_insert_id,
            rows_affected,
        } = output;
        let columns = Columns::new(columns);
        let records = rows
            .into_iter()
            .map(|values| Record::new(columns.clone(), values))
            .collect();
        Self {
            records,
            last_insert_id,
            rows_affected: rows_affected.unwrap_or(-1),
            error: None,
        }
    }

    pub(crate) fn failed(error: PoolError) -> Self {
        Self {
            records: Vec::new(),
            last_insert_id: None,
            rows_affected: -1,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn error(&self) -> Option<&PoolError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    #[must_use]
    pub fn last_insert_id(&self) -> Option<&Value> {
        self.last_insert_id.as_ref()
    }

    /// Rows changed by the statement, or -1 when the driver cannot tell (e.g. a `SELECT`).
    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// Convert into a `Result` so callers can use `?`.
    ///
    /// # Errors
    /// Returns the carried [`PoolError`] when the call failed.
    pub fn into_result(self) -> Result<Self, PoolError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
