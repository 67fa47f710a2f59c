//! Request and response payloads.
//!
//! Field and table definitions serialize straight into the destination's
//! create-table body.

use serde::{Deserialize, Serialize};
use sync_core::Fields;

/// One choice in a select field's option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
    pub color: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProperty {
    pub options: Vec<SelectOption>,
}

/// A field in a create-table request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_name: String,
    #[serde(rename = "type")]
    pub type_code: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<FieldProperty>,
}

/// A create-table request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub default_view_name: String,
    pub fields: Vec<FieldDefinition>,
}

/// Cursor for listing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: usize,
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            page_token: None,
        }
    }

    pub fn after(page_size: usize, page_token: impl Into<String>) -> Self {
        Self {
            page_size,
            page_token: Some(page_token.into()),
        }
    }
}

/// A record as stored in the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub record_id: String,
    #[serde(default)]
    pub fields: Fields,
}

/// One page of records plus the continuation cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    pub items: Vec<ExistingRecord>,
    pub has_more: bool,
    pub page_token: Option<String>,
}

/// An update of one existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub record_id: String,
    pub fields: Fields,
}
