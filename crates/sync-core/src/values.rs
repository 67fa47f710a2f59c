//! Value representations on both sides of a sync.
//!
//! [`SourceValue`] is what the source database hands back for a cell.
//! [`FieldValue`] is what gets written to the destination after the
//! column's conversion rule has been applied. A `NULL` source cell has no
//! `FieldValue` at all: converted rows simply omit the field.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell as read from the source database.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Character data, and numeric types the driver reports as text (DECIMAL).
    Text(String),
    /// Binary column data.
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SourceValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SourceValue::Null)
    }

    /// Textual rendering used when a value falls back to its string form.
    pub fn to_text(&self) -> String {
        match self {
            SourceValue::Null => String::new(),
            SourceValue::Int(i) => i.to_string(),
            SourceValue::UInt(u) => u.to_string(),
            SourceValue::Float(f) => f.to_string(),
            SourceValue::Text(s) => s.clone(),
            SourceValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            SourceValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            SourceValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for SourceValue {
    fn from(s: &str) -> Self {
        SourceValue::Text(s.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(s: String) -> Self {
        SourceValue::Text(s)
    }
}

impl From<i64> for SourceValue {
    fn from(i: i64) -> Self {
        SourceValue::Int(i)
    }
}

impl From<f64> for SourceValue {
    fn from(f: f64) -> Self {
        SourceValue::Float(f)
    }
}

/// A source row: column name to cell value.
pub type SourceRow = BTreeMap<String, SourceValue>;

/// A converted value, in the shape the destination accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

/// A record's field set. Absent (null) fields are never present as keys.
pub type Fields = BTreeMap<String, FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Float(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::Text("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_integral_float_renders_like_integer() {
        // Destinations may hand back 3 for a value written as 3.0
        assert_eq!(
            FieldValue::Float(3.0).to_string(),
            FieldValue::Integer(3).to_string()
        );
    }

    #[test]
    fn test_field_value_json_shape() {
        let mut fields = Fields::new();
        fields.insert("a".into(), FieldValue::Integer(1));
        fields.insert("b".into(), FieldValue::Text("x".into()));
        fields.insert("c".into(), FieldValue::Bool(false));
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1, "b": "x", "c": false}));

        let back: Fields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_source_value_to_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(SourceValue::DateTime(dt).to_text(), "2024-01-02 03:04:05");
        assert_eq!(SourceValue::Bytes(b"hi".to_vec()).to_text(), "hi");
        assert_eq!(SourceValue::UInt(7).to_text(), "7");
        assert!(SourceValue::Null.is_null());
    }
}
