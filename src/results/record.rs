use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::types::Value;

/// Column names of one result, shared by every record it produced.
#[derive(Debug, PartialEq, Eq)]
pub struct Columns {
    names: Vec<String>,
    // First occurrence wins when a statement returns duplicate column names.
    index: HashMap<String, usize>,
}

impl Columns {
    #[must_use]
    pub fn new(names: Vec<String>) -> Arc<Self> {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Arc::new(Self { names, index })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row: ordered `(field name, value)` pairs in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<Columns>,
    values: Vec<Value>,
}

impl Record {
    /// Missing trailing values are padded with `NULL` so every column has a value.
    #[must_use]
    pub fn new(columns: Arc<Columns>, mut values: Vec<Value>) -> Self {
        if values.len() < columns.len() {
            values.resize(columns.len(), Value::Null);
        }
        values.truncate(columns.len());
        Self { columns, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.position(name).and_then(|i| self.values.get(i))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.columns.names().get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// JSON object preserving column order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.len());
        for (name, value) in self.iter() {
            map.entry(name.to_string()).or_insert_with(|| value.to_json());
        }
        JsonValue::Object(map)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let columns = Columns::new(vec!["id".into(), "name".into(), "id".into()]);
        Record::new(
            columns,
            vec![Value::Int(7), Value::Text("seven".into()), Value::Int(8)],
        )
    }

    #[test]
    fn lookup_by_name_prefers_first_duplicate() {
        let r = record();
        assert_eq!(r.get("id"), Some(&Value::Int(7)));
        assert_eq!(r.get_by_index(2), Some(&Value::Int(8)));
        assert_eq!(r.get("missing"), None);
        assert_eq!(r.field_name(1), Some("name"));
    }

    #[test]
    fn iteration_follows_column_order() {
        let r = record();
        let names: Vec<&str> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "name", "id"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let r = Record::new(Columns::new(vec!["a".into(), "b".into()]), vec![Value::Int(1)]);
        assert_eq!(r.get("b"), Some(&Value::Null));
    }
}
