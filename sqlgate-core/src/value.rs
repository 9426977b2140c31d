//! Schema-less result representation and the row-to-record transcoder.
//!
//! A query result is a snapshot: an ordered sequence of records, each mapping
//! column name to a tagged native value. Results are built fresh per
//! execution and discarded after serialization; nothing is cached.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::driver::QueryOutput;

/// A single result cell.
///
/// Closed tagged union over the scalar shapes drivers actually produce.
/// Serializes to the natural JSON scalar; bytes render as base64 text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64.encode(b)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// One result row: column name mapped to its cell value, in column order.
pub type Record = IndexMap<String, Value>;

/// Ordered sequence of records representing a complete query result snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct RecordSet(Vec<Record>);

impl RecordSet {
    /// Transcode driver output into records, preserving row order.
    ///
    /// Every column of every row is carried over (the record shape is the
    /// full column list). Spaces in column names are rewritten to
    /// underscores. Duplicate names (including those produced by that
    /// rewrite) resolve last-write-wins: the later cell replaces the
    /// earlier value while the column keeps its first position. Changing
    /// either rule would alter observed client behavior.
    pub fn from_output(output: QueryOutput) -> RecordSet {
        let records = output
            .rows
            .into_iter()
            .map(|row| {
                let mut record = Record::with_capacity(output.columns.len());
                for (name, cell) in output.columns.iter().zip(row) {
                    record.insert(name.replace(' ', "_"), cell);
                }
                record
            })
            .collect();

        RecordSet(records)
    }

    pub fn records(&self) -> &[Record] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
