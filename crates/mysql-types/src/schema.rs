//! MySQL column type → destination field kind.

use sync_core::FieldKind;

/// Reduce a raw column type to its base name.
///
/// Everything from the first `(` on is dropped, as are trailing modifiers
/// such as `unsigned` or `zerofill`; the result is lowercase.
///
/// ```
/// use mysql_types::normalize_type;
///
/// assert_eq!(normalize_type("VARCHAR(255)"), "varchar");
/// assert_eq!(normalize_type("int(10) unsigned"), "int");
/// assert_eq!(normalize_type("bigint unsigned"), "bigint");
/// ```
pub fn normalize_type(raw_type: &str) -> String {
    let before_paren = raw_type.split('(').next().unwrap_or(raw_type);
    before_paren
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Map a raw MySQL column type to the destination field kind.
///
/// Total: any type not listed maps to [`FieldKind::Text`].
pub fn map_type(raw_type: &str) -> FieldKind {
    match normalize_type(raw_type).as_str() {
        // Numeric types
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => FieldKind::Number,
        "float" | "double" | "real" | "decimal" | "numeric" => FieldKind::Number,
        "year" => FieldKind::Number,

        // String types
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" => FieldKind::Text,

        // Date/Time types
        "date" | "time" | "datetime" | "timestamp" => FieldKind::DateTime,

        // Short binary strings stay text; blobs become attachments
        "binary" | "varbinary" => FieldKind::Text,
        "tinyblob" | "blob" | "mediumblob" | "longblob" => FieldKind::Attachment,

        "json" => FieldKind::Text,

        "enum" => FieldKind::SingleSelect,
        "set" => FieldKind::MultiSelect,

        "boolean" | "bool" => FieldKind::Checkbox,

        _ => FieldKind::Text,
    }
}
