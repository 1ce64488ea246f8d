use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PoolError;

/// A single column value or bound parameter.
///
/// ```rust
/// use sql_affinity_pool::prelude::*;
///
/// let params = vec![Value::from(5), Value::from("alice"), Value::Null];
/// assert_eq!(params[0].as_int(), Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Json(JsonValue),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view; booleans map to 0/1 the way most drivers store them.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Timestamps may come back from text-typed columns, so both `%F %T` and `%F %T%.f` parse.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Self::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Lossless where JSON allows it; blobs become arrays of bytes.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => JsonValue::from(*f),
            Self::Text(s) => JsonValue::from(s.as_str()),
            Self::Bool(b) => JsonValue::from(*b),
            Self::Timestamp(ts) => JsonValue::from(ts.format("%F %T%.f").to_string()),
            Self::Json(j) => j.clone(),
            Self::Blob(bytes) => JsonValue::from(bytes.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%F %T%.f")),
            Self::Json(j) => write!(f, "{j}"),
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    bool => Bool,
    String => Text,
    &str => Text,
    NaiveDateTime => Timestamp,
    JsonValue => Json,
    Vec<u8> => Blob,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Native driver family a pool connects to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Mysql,
    Sqlite,
    Postgres,
    Oracle,
    Odbc,
    Db2,
    Tds,
    Interbase,
}

impl DriverKind {
    pub const ALL: [DriverKind; 8] = [
        Self::Mysql,
        Self::Sqlite,
        Self::Postgres,
        Self::Oracle,
        Self::Odbc,
        Self::Db2,
        Self::Tds,
        Self::Interbase,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Oracle => "oracle",
            Self::Odbc => "odbc",
            Self::Db2 => "db2",
            Self::Tds => "tds",
            Self::Interbase => "interbase",
        }
    }

    /// Name of the equivalent Qt SQL plugin, still common in existing connection settings.
    #[must_use]
    pub fn legacy_name(self) -> &'static str {
        match self {
            Self::Mysql => "QMYSQL",
            Self::Sqlite => "QSQLITE",
            Self::Postgres => "QPSQL",
            Self::Oracle => "QOCI",
            Self::Odbc => "QODBC",
            Self::Db2 => "QDB2",
            Self::Tds => "QTDS",
            Self::Interbase => "QIBASE",
        }
    }

    /// Trivial statement used to tell a dead connection from a bad statement.
    #[must_use]
    pub fn probe_statement(self) -> &'static str {
        match self {
            // Oracle has no FROM-less SELECT.
            Self::Oracle => "SELECT 1 FROM dual",
            _ => "SELECT 1",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(s) || kind.legacy_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| PoolError::Config(format!("unknown driver kind: {s}")))
    }
}

/// Arguments bound to one statement. Exactly one binding style is active per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    /// Bound by 0-based position, in order.
    Positional(Vec<Value>),
    /// Bound by placeholder name; name matching rules belong to the driver.
    Named(BTreeMap<String, Value>),
}

impl Params {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build named params from any iterator of `(name, value)` pairs; later duplicates win.
    pub fn named<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self::Named(values)
    }
}

/// SQL text plus its bound arguments, as shipped to a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub sql: String,
    pub params: Params,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}
