use rusqlite::{Connection, ErrorCode};

use crate::driver::StatementOutput;
use crate::error::{DriverError, DriverErrorKind};
use crate::types::{Params, Value};

use super::params::{bind_params, from_value_ref};

/// Prepare, bind and run one statement, draining every row it yields.
///
/// The connection's rowid and change counters are sampled around the statement, so leading
/// comments, `WITH ... INSERT` and `RETURNING` clauses report the same metadata as a plain
/// insert. Pure queries report no change count.
///
/// # Errors
/// Returns a [`DriverError`] if preparation, binding or stepping fails.
pub fn run_statement(
    conn: &Connection,
    sql: &str,
    params: &Params,
) -> Result<StatementOutput, DriverError> {
    let rowid_before = conn.last_insert_rowid();
    let changes_before = conn.total_changes();

    let mut stmt = conn.prepare(sql).map_err(statement_error)?;
    bind_params(&mut stmt, params)?;

    if stmt.column_count() == 0 {
        let changed = stmt.raw_execute().map_err(statement_error)?;
        return Ok(StatementOutput {
            columns: Vec::new(),
            rows: Vec::new(),
            last_insert_id: new_rowid(conn, rowid_before),
            rows_affected: Some(i64::try_from(changed).unwrap_or(i64::MAX)),
        });
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let mut out = Vec::new();
    {
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(statement_error)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value_ref(row.get_ref(i).map_err(statement_error)?));
            }
            out.push(values);
        }
    }

    let changed = conn.total_changes().saturating_sub(changes_before);
    Ok(StatementOutput {
        columns,
        rows: out,
        last_insert_id: new_rowid(conn, rowid_before),
        rows_affected: (changed > 0).then(|| i64::try_from(changed).unwrap_or(i64::MAX)),
    })
}

fn new_rowid(conn: &Connection, before: i64) -> Option<Value> {
    let now = conn.last_insert_rowid();
    (now != before).then_some(Value::Int(now))
}

pub(crate) fn statement_error(err: rusqlite::Error) -> DriverError {
    map_error(err, DriverErrorKind::Statement)
}

pub(crate) fn connection_error(err: rusqlite::Error) -> DriverError {
    map_error(err, DriverErrorKind::Connection)
}

/// Keep the SQLite result code and message; a few codes always mean the connection is unusable.
fn map_error(err: rusqlite::Error, fallback: DriverErrorKind) -> DriverError {
    match &err {
        rusqlite::Error::SqliteFailure(ffi_err, message) => {
            let kind = match ffi_err.code {
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure => DriverErrorKind::Connection,
                _ => fallback,
            };
            let mut mapped = DriverError::new(kind, ffi_err.to_string())
                .with_native_code(ffi_err.extended_code.to_string());
            if let Some(message) = message {
                mapped = mapped.with_database_text(message.clone());
            }
            mapped
        }
        _ => DriverError::new(fallback, err.to_string()),
    }
}
