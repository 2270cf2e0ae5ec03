use rusqlite::types::Value;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// One sqlite cell, by storage class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Integer(n) => CellValue::Integer(n),
            Value::Real(f) => CellValue::Real(f),
            Value::Text(s) => CellValue::Text(s),
            Value::Blob(b) => CellValue::Blob(b),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Real(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Blob(b) => write!(f, "[{} bytes]", b.len()),
        }
    }
}

/// Rows returned by a read query, with the column names sqlite reported.
///
/// Serializes as an array of objects whose keys follow column order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

/// a row viewed as named fields
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.cells.get(i))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in self.fields() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}
