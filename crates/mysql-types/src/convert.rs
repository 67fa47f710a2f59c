//! Cell conversion: SourceValue → FieldValue.
//!
//! Each column gets a [`ValueRule`] derived from its raw type. Nulls always
//! convert to `None` so the field is left out of the record entirely.
//!
//! Values that cannot be coerced (unparseable timestamps, numbers stored as
//! garbage text) are not errors: they fall back to their string form and a
//! warning is logged.

use crate::schema::{map_type, normalize_type};
use chrono::{NaiveDateTime, NaiveTime};
use sync_core::{ColumnSchema, FieldKind, FieldValue, SourceValue};
use tracing::warn;

/// Layout accepted for textual datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a column's values are coerced before being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Milliseconds since the Unix epoch (naive values read as UTC).
    ///
    /// DATE and DATETIME carry no zone, so this assumes the MySQL server
    /// stores UTC; on a server in another zone every value is shifted by
    /// its offset.
    EpochMillis,
    Boolean,
    Integer,
    Float,
    Text,
}

impl ValueRule {
    pub fn for_type(raw_type: &str) -> Self {
        match normalize_type(raw_type).as_str() {
            "date" | "datetime" | "timestamp" => ValueRule::EpochMillis,
            "boolean" | "bool" => ValueRule::Boolean,
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
                ValueRule::Integer
            }
            "float" | "double" | "real" | "decimal" | "numeric" => ValueRule::Float,
            _ => ValueRule::Text,
        }
    }

    /// Apply the rule. `None` means the value is absent.
    pub fn apply(self, value: &SourceValue) -> Option<Converted> {
        if value.is_null() {
            return None;
        }
        let converted = match self {
            ValueRule::EpochMillis => to_epoch_millis(value),
            ValueRule::Boolean => to_bool(value),
            ValueRule::Integer => to_integer(value),
            ValueRule::Float => to_float(value),
            ValueRule::Text => Converted::Exact(FieldValue::Text(value.to_text())),
        };
        Some(converted)
    }
}

/// Result of applying a [`ValueRule`] to a non-null value.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Exact(FieldValue),
    /// The value could not be coerced and is carried as text.
    Fallback(FieldValue),
}

impl Converted {
    pub fn into_value(self) -> FieldValue {
        match self {
            Converted::Exact(v) | Converted::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Converted::Fallback(_))
    }
}

fn fallback(value: &SourceValue) -> Converted {
    Converted::Fallback(FieldValue::Text(value.to_text()))
}

fn to_epoch_millis(value: &SourceValue) -> Converted {
    match value {
        SourceValue::DateTime(dt) => Converted::Exact(FieldValue::Integer(
            dt.and_utc().timestamp_millis(),
        )),
        SourceValue::Date(d) => Converted::Exact(FieldValue::Integer(
            d.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
        )),
        SourceValue::Text(_) | SourceValue::Bytes(_) => {
            let text = value.to_text();
            match NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT) {
                Ok(dt) => Converted::Exact(FieldValue::Integer(dt.and_utc().timestamp_millis())),
                Err(_) => Converted::Fallback(FieldValue::Text(text)),
            }
        }
        _ => fallback(value),
    }
}

fn to_bool(value: &SourceValue) -> Converted {
    match value {
        SourceValue::Int(i) => Converted::Exact(FieldValue::Bool(*i != 0)),
        SourceValue::UInt(u) => Converted::Exact(FieldValue::Bool(*u != 0)),
        SourceValue::Float(f) => Converted::Exact(FieldValue::Bool(*f != 0.0)),
        SourceValue::Text(_) | SourceValue::Bytes(_) => {
            let text = value.to_text();
            match text.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Converted::Exact(FieldValue::Bool(true)),
                "0" | "false" | "no" | "off" | "" => Converted::Exact(FieldValue::Bool(false)),
                _ => Converted::Fallback(FieldValue::Text(text)),
            }
        }
        _ => fallback(value),
    }
}

fn to_integer(value: &SourceValue) -> Converted {
    match value {
        SourceValue::Int(i) => Converted::Exact(FieldValue::Integer(*i)),
        SourceValue::UInt(u) => match i64::try_from(*u) {
            Ok(i) => Converted::Exact(FieldValue::Integer(i)),
            Err(_) => fallback(value),
        },
        SourceValue::Float(f) => float_to_integer(*f).unwrap_or_else(|| fallback(value)),
        SourceValue::Text(_) | SourceValue::Bytes(_) => {
            let text = value.to_text();
            let trimmed = text.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Converted::Exact(FieldValue::Integer(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(float_to_integer)
                .unwrap_or(Converted::Fallback(FieldValue::Text(text)))
        }
        _ => fallback(value),
    }
}

/// Truncate toward zero, as integer coercion of a float does.
fn float_to_integer(f: f64) -> Option<Converted> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64 {
        Some(Converted::Exact(FieldValue::Integer(t as i64)))
    } else {
        None
    }
}

fn to_float(value: &SourceValue) -> Converted {
    match value {
        SourceValue::Int(i) => Converted::Exact(FieldValue::Float(*i as f64)),
        SourceValue::UInt(u) => Converted::Exact(FieldValue::Float(*u as f64)),
        SourceValue::Float(f) if f.is_finite() => Converted::Exact(FieldValue::Float(*f)),
        SourceValue::Text(_) | SourceValue::Bytes(_) => {
            let text = value.to_text();
            match text.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Converted::Exact(FieldValue::Float(f)),
                _ => Converted::Fallback(FieldValue::Text(text)),
            }
        }
        _ => fallback(value),
    }
}

/// Convert one cell according to its column's raw type.
pub fn convert_value(value: &SourceValue, raw_type: &str) -> Option<FieldValue> {
    let converted = ValueRule::for_type(raw_type).apply(value)?;
    if converted.is_fallback() {
        warn!(
            raw_type,
            raw = %value.to_text(),
            "Value could not be coerced, using its text form"
        );
    }
    Some(converted.into_value())
}

/// How one source column lands in the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub column_name: String,
    pub kind: FieldKind,
    pub rule: ValueRule,
}

impl FieldMapping {
    pub fn for_column(column: &ColumnSchema) -> Self {
        Self {
            column_name: column.name.clone(),
            kind: map_type(&column.raw_type),
            rule: ValueRule::for_type(&column.raw_type),
        }
    }

    /// Convert a cell of this column; `None` when the cell is null.
    pub fn convert(&self, value: &SourceValue) -> Option<FieldValue> {
        let converted = self.rule.apply(value)?;
        if converted.is_fallback() {
            warn!(
                column = %self.column_name,
                kind = %self.kind,
                raw = %value.to_text(),
                "Value could not be coerced, using its text form"
            );
        }
        Some(converted.into_value())
    }
}

/// Mappings for every column, in column order.
pub fn mappings_for(columns: &[ColumnSchema]) -> Vec<FieldMapping> {
    columns.iter().map(FieldMapping::for_column).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_null_is_absent_for_every_rule() {
        for t in ["int", "double", "datetime", "bool", "varchar(10)", "blob"] {
            assert_eq!(convert_value(&SourceValue::Null, t), None, "{t}");
        }
    }

    #[test]
    fn test_datetime_to_epoch_millis() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        assert_eq!(
            convert_value(&SourceValue::DateTime(dt), "datetime"),
            Some(FieldValue::Integer(1_704_067_201_000))
        );
    }

    #[test]
    fn test_date_to_midnight_epoch_millis() {
        let d = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(
            convert_value(&SourceValue::Date(d), "date"),
            Some(FieldValue::Integer(86_400_000))
        );
    }

    #[test]
    fn test_textual_datetime_is_parsed() {
        assert_eq!(
            convert_value(&SourceValue::Text("1970-01-01 00:00:10".into()), "timestamp"),
            Some(FieldValue::Integer(10_000))
        );
    }

    #[test]
    fn test_unparseable_datetime_keeps_original_text() {
        let raw = SourceValue::Text("0000-00-00 00:00:00".into());
        let rule = ValueRule::for_type("datetime");
        let converted = rule.apply(&raw).unwrap();
        assert!(converted.is_fallback());
        assert_eq!(
            converted.into_value(),
            FieldValue::Text("0000-00-00 00:00:00".into())
        );
    }

    #[test]
    fn test_time_is_text() {
        assert_eq!(ValueRule::for_type("time"), ValueRule::Text);
        assert_eq!(
            convert_value(&SourceValue::Text("12:30:00".into()), "time"),
            Some(FieldValue::Text("12:30:00".into()))
        );
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            convert_value(&SourceValue::Int(1), "boolean"),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            convert_value(&SourceValue::Int(0), "bool"),
            Some(FieldValue::Bool(false))
        );
        assert_eq!(
            convert_value(&SourceValue::Text("true".into()), "bool"),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(
            convert_value(&SourceValue::Int(-5), "int(11)"),
            Some(FieldValue::Integer(-5))
        );
        assert_eq!(
            convert_value(&SourceValue::UInt(7), "bigint unsigned"),
            Some(FieldValue::Integer(7))
        );
        assert_eq!(
            convert_value(&SourceValue::Text(" 12 ".into()), "smallint"),
            Some(FieldValue::Integer(12))
        );
        assert_eq!(
            convert_value(&SourceValue::Float(2.9), "int"),
            Some(FieldValue::Integer(2))
        );
        assert_eq!(
            convert_value(&SourceValue::Int(2024), "year"),
            Some(FieldValue::Integer(2024))
        );
    }

    #[test]
    fn test_oversized_unsigned_falls_back_to_text() {
        assert_eq!(
            convert_value(&SourceValue::UInt(u64::MAX), "bigint unsigned"),
            Some(FieldValue::Text(u64::MAX.to_string()))
        );
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(
            convert_value(&SourceValue::Text("12.50".into()), "decimal(10,2)"),
            Some(FieldValue::Float(12.5))
        );
        assert_eq!(
            convert_value(&SourceValue::Int(3), "double"),
            Some(FieldValue::Float(3.0))
        );
        assert_eq!(
            convert_value(&SourceValue::Text("n/a".into()), "float"),
            Some(FieldValue::Text("n/a".into()))
        );
    }

    #[test]
    fn test_everything_else_is_text() {
        assert_eq!(
            convert_value(&SourceValue::Int(5), "varchar(10)"),
            Some(FieldValue::Text("5".into()))
        );
        assert_eq!(
            convert_value(&SourceValue::Text("a,b".into()), "set('a','b')"),
            Some(FieldValue::Text("a,b".into()))
        );
        assert_eq!(
            convert_value(&SourceValue::Bytes(b"raw".to_vec()), "blob"),
            Some(FieldValue::Text("raw".into()))
        );
    }

    #[test]
    fn test_field_mapping_for_column() {
        let column = ColumnSchema::new("created_at", "timestamp");
        let mapping = FieldMapping::for_column(&column);
        assert_eq!(mapping.kind, FieldKind::DateTime);
        assert_eq!(mapping.rule, ValueRule::EpochMillis);
        assert_eq!(mapping.convert(&SourceValue::Null), None);
    }

    #[test]
    fn test_mappings_keep_column_order() {
        let columns = vec![
            ColumnSchema::new("b", "int"),
            ColumnSchema::new("a", "text"),
        ];
        let names: Vec<String> = mappings_for(&columns)
            .into_iter()
            .map(|m| m.column_name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
