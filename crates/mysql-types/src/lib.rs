//! MySQL type mapping for base-sync.
//!
//! This crate maps MySQL column types onto the destination's field kinds and
//! converts cell values into the shape the destination accepts.
//!
//! # Structure
//!
//! - `schema`: raw MySQL column type → [`FieldKind`](sync_core::FieldKind)
//! - `convert`: [`SourceValue`](sync_core::SourceValue) → [`FieldValue`](sync_core::FieldValue)
//! - `reverse`: `mysql_async::Value` → `SourceValue` (for reading rows)
//!
//! # Example
//!
//! ```rust
//! use mysql_types::{convert_value, map_type};
//! use sync_core::{FieldKind, FieldValue, SourceValue};
//!
//! assert_eq!(map_type("varchar(255)"), FieldKind::Text);
//! assert_eq!(map_type("enum('s','m','l')"), FieldKind::SingleSelect);
//! assert_eq!(map_type("geometry"), FieldKind::Text);
//!
//! let v = convert_value(&SourceValue::Text("42".into()), "int(11)");
//! assert_eq!(v, Some(FieldValue::Integer(42)));
//! ```

pub mod convert;
pub mod reverse;
pub mod schema;

pub use convert::{convert_value, mappings_for, FieldMapping, ValueRule, DATETIME_FORMAT};
pub use reverse::{mysql_value_to_source_value, BINARY_CHARSET};
pub use schema::{map_type, normalize_type};
