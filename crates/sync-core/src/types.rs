//! Destination field kinds.
//!
//! A destination table only knows seven kinds of field. Every source column
//! is mapped onto exactly one of them (see the `mysql-types` crate).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of field kinds supported by the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    SingleSelect,
    MultiSelect,
    DateTime,
    Checkbox,
    Attachment,
}

impl FieldKind {
    /// All kinds, in type-code order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::SingleSelect,
        FieldKind::MultiSelect,
        FieldKind::DateTime,
        FieldKind::Checkbox,
        FieldKind::Attachment,
    ];

    /// Numeric type code used by the destination's create-table API.
    pub fn type_code(self) -> u8 {
        match self {
            FieldKind::Text => 1,
            FieldKind::Number => 2,
            FieldKind::SingleSelect => 3,
            FieldKind::MultiSelect => 4,
            FieldKind::DateTime => 5,
            FieldKind::Checkbox => 7,
            FieldKind::Attachment => 11,
        }
    }

    /// UI kind hint sent alongside the type code.
    ///
    /// Text and Number are the destination's defaults and carry no hint.
    pub fn ui_type(self) -> Option<&'static str> {
        match self {
            FieldKind::Text | FieldKind::Number => None,
            other => Some(other.as_str()),
        }
    }

    /// Whether the field needs an option set at creation time.
    pub fn is_choice(self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::MultiSelect)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Number => "Number",
            FieldKind::SingleSelect => "SingleSelect",
            FieldKind::MultiSelect => "MultiSelect",
            FieldKind::DateTime => "DateTime",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Attachment => "Attachment",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes_are_distinct() {
        let mut codes: Vec<u8> = FieldKind::ALL.iter().map(|k| k.type_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), FieldKind::ALL.len());
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(FieldKind::Text.type_code(), 1);
        assert_eq!(FieldKind::Number.type_code(), 2);
        assert_eq!(FieldKind::SingleSelect.type_code(), 3);
        assert_eq!(FieldKind::MultiSelect.type_code(), 4);
        assert_eq!(FieldKind::DateTime.type_code(), 5);
        assert_eq!(FieldKind::Checkbox.type_code(), 7);
        assert_eq!(FieldKind::Attachment.type_code(), 11);
    }

    #[test]
    fn test_ui_type_hints() {
        assert_eq!(FieldKind::Text.ui_type(), None);
        assert_eq!(FieldKind::Number.ui_type(), None);
        assert_eq!(FieldKind::SingleSelect.ui_type(), Some("SingleSelect"));
        assert_eq!(FieldKind::Attachment.ui_type(), Some("Attachment"));
    }

    #[test]
    fn test_choice_kinds() {
        let choices: Vec<FieldKind> = FieldKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_choice())
            .collect();
        assert_eq!(choices, vec![FieldKind::SingleSelect, FieldKind::MultiSelect]);
    }
}
