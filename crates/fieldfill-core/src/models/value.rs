//! Data values supplied by the caller.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered data dictionary. Key order is the dictionary iteration order.
pub type DataRecord = IndexMap<String, DataValue>;

/// A scalar or temporal value a field may be filled with.
///
/// Values are carried as-is; presentation formatting belongs to the writer.
/// JSON strings always stay `Text`, even when they look like dates. Temporal
/// values only come from typed callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    #[serde(skip_deserializing)]
    DateTime(NaiveDateTime),
    #[serde(skip_deserializing)]
    Date(NaiveDate),
    Text(String),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::DateTime(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for DataValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for DataValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

/// Parse a data dictionary from a JSON object, keeping key order.
pub fn parse_data_record(json: &str) -> serde_json::Result<DataRecord> {
    serde_json::from_str(json)
}
