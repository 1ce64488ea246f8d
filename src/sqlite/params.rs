use rusqlite::Statement;
use rusqlite::types::{Value as SqliteValue, ValueRef};

use crate::error::DriverError;
use crate::types::{Params, Value};

use super::query::statement_error;

const NAMED_PREFIXES: [char; 3] = [':', '@', '$'];

/// Convert a pool value to the rusqlite representation.
///
/// SQLite has no boolean, timestamp or JSON storage class: booleans become 0/1, timestamps
/// `%F %T%.f` text and JSON its serialized text.
#[must_use]
pub fn to_sqlite_value(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Int(i) => SqliteValue::Integer(*i),
        Value::Float(f) => SqliteValue::Real(*f),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Timestamp(ts) => SqliteValue::Text(ts.format("%F %T%.f").to_string()),
        Value::Json(j) => SqliteValue::Text(j.to_string()),
        Value::Blob(bytes) => SqliteValue::Blob(bytes.clone()),
    }
}

#[must_use]
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Bind `params` onto a freshly prepared statement.
///
/// Positional values bind to `?1..?n` in order. Named values match `:name`, `@name` or `$name`;
/// a name that already carries one of those prefixes is used as written.
///
/// # Errors
/// Returns a statement-kind [`DriverError`] for unknown names or out-of-range positions.
pub fn bind_params(stmt: &mut Statement<'_>, params: &Params) -> Result<(), DriverError> {
    match params {
        Params::None => Ok(()),
        Params::Positional(values) => {
            let expected = stmt.parameter_count();
            if values.len() > expected {
                return Err(DriverError::statement(format!(
                    "{} positional values supplied but the statement takes {expected}",
                    values.len()
                )));
            }
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, to_sqlite_value(value))
                    .map_err(statement_error)?;
            }
            Ok(())
        }
        Params::Named(values) => {
            for (name, value) in values {
                let index = resolve_name(stmt, name)?;
                stmt.raw_bind_parameter(index, to_sqlite_value(value))
                    .map_err(statement_error)?;
            }
            Ok(())
        }
    }
}

fn resolve_name(stmt: &Statement<'_>, name: &str) -> Result<usize, DriverError> {
    if name.starts_with(NAMED_PREFIXES) {
        if let Some(index) = stmt.parameter_index(name).map_err(statement_error)? {
            return Ok(index);
        }
    } else {
        for prefix in NAMED_PREFIXES {
            let candidate = format!("{prefix}{name}");
            if let Some(index) = stmt.parameter_index(&candidate).map_err(statement_error)? {
                return Ok(index);
            }
        }
    }
    Err(DriverError::statement(format!("no parameter named {name}")))
}
