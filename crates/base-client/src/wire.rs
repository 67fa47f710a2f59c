//! Wire format of the Bitable open API.

use base_sink::{ExistingRecord, SinkError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sync_core::{FieldValue, Fields};

/// Decode a `{code, msg, data}` envelope.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &str,
) -> Result<T, SinkError> {
    let envelope: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) if (200..300).contains(&status) => {
            return Err(SinkError::Decode(format!("invalid JSON body: {e}")))
        }
        Err(_) => {
            return Err(SinkError::Http {
                status,
                body: body.to_string(),
            })
        }
    };

    let code = envelope.get("code").and_then(Value::as_i64).unwrap_or(-1);
    if code != 0 {
        let message = envelope
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("no message")
            .to_string();
        return Err(SinkError::Api { code, message });
    }

    let data = envelope.get("data").cloned().unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| SinkError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableItem {
    pub table_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableList {
    #[serde(default)]
    pub items: Option<Vec<TableItem>>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTable {
    pub table_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    pub record_id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

impl RawRecord {
    pub fn into_record(self) -> ExistingRecord {
        let fields: Fields = self
            .fields
            .iter()
            .filter_map(|(name, value)| field_value_from_json(value).map(|v| (name.clone(), v)))
            .collect();
        ExistingRecord {
            record_id: self.record_id,
            fields,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordList {
    #[serde(default)]
    pub items: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedRecord {
    pub record_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedRecords {
    #[serde(default)]
    pub records: Vec<CreatedRecord>,
}

/// Normalise a field value as returned by the API.
///
/// Text fields can come back as rich-text segments
/// (`[{"type": "text", "text": "..."}]`); those are concatenated. String
/// arrays (multi-select) are joined with `,`. Anything else without a
/// scalar form is kept as its JSON text.
pub fn field_value_from_json(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Float),
        },
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => {
            if let Some(segments) = items
                .iter()
                .map(|item| item.get("text").and_then(Value::as_str))
                .collect::<Option<Vec<&str>>>()
            {
                return Some(FieldValue::Text(segments.concat()));
            }
            if let Some(strings) = items
                .iter()
                .map(Value::as_str)
                .collect::<Option<Vec<&str>>>()
            {
                return Some(FieldValue::Text(strings.join(",")));
            }
            Some(FieldValue::Text(value.to_string()))
        }
        Value::Object(map) => match map.get("text").and_then(Value::as_str) {
            Some(text) => Some(FieldValue::Text(text.to_string())),
            None => Some(FieldValue::Text(value.to_string())),
        },
    }
}
