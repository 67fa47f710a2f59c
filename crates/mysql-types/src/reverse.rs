//! Reverse conversion: MySQL values → SourceValue
//!
//! Rows are read over the binary protocol, so numbers and temporal values
//! arrive typed. DECIMAL arrives as text and stays text here; the column's
//! value rule turns it into a float later.

use chrono::{NaiveDate, NaiveTime};
use mysql_async::consts::ColumnType;
use mysql_async::Value;
use sync_core::SourceValue;

/// Character set id MySQL reports for binary (non-text) columns.
pub const BINARY_CHARSET: u16 = 63;

/// Convert a raw MySQL value into a [`SourceValue`].
///
/// Zero dates (`0000-00-00`) and other values chrono rejects are carried
/// as their MySQL text form.
pub fn mysql_value_to_source_value(
    value: Value,
    column_type: ColumnType,
    character_set: u16,
) -> SourceValue {
    match value {
        Value::NULL => SourceValue::Null,
        Value::Int(i) => SourceValue::Int(i),
        Value::UInt(u) => SourceValue::UInt(u),
        Value::Float(f) => SourceValue::Float(f as f64),
        Value::Double(f) => SourceValue::Float(f),
        Value::Bytes(bytes) => {
            if character_set == BINARY_CHARSET && is_blob_like(column_type) {
                SourceValue::Bytes(bytes)
            } else {
                match String::from_utf8(bytes) {
                    Ok(s) => SourceValue::Text(s),
                    Err(e) => SourceValue::Bytes(e.into_bytes()),
                }
            }
        }
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            let is_date_only = matches!(
                column_type,
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
            );
            match date {
                Some(d) if is_date_only => SourceValue::Date(d),
                Some(d) => match NaiveTime::from_hms_micro_opt(
                    hour as u32,
                    minute as u32,
                    second as u32,
                    micros,
                ) {
                    Some(t) => SourceValue::DateTime(d.and_time(t)),
                    None => SourceValue::Text(format_mysql_datetime(
                        year, month, day, hour, minute, second,
                    )),
                },
                None if is_date_only => {
                    SourceValue::Text(format!("{year:04}-{month:02}-{day:02}"))
                }
                None => SourceValue::Text(format_mysql_datetime(
                    year, month, day, hour, minute, second,
                )),
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = days * 24 + hours as u32;
            let sign = if negative { "-" } else { "" };
            let text = if micros > 0 {
                format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
            } else {
                format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
            };
            SourceValue::Text(text)
        }
    }
}

fn format_mysql_datetime(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> String {
    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
}

/// Column types whose binary-charset payload is raw bytes rather than text.
fn is_blob_like(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_GEOMETRY
    )
}
