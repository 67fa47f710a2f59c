//! Row identity keys.
//!
//! An [`IdentityKey`] decides whether a source row becomes a create or an
//! update of an existing destination record. The same derivation is applied
//! to destination records when indexing them and to source rows when
//! classifying them; the two must never diverge.

use crate::values::Fields;
use md5::{Digest, Md5};
use std::fmt;

/// Separator between `name:value` pairs in the content hash input.
const PAIR_SEPARATOR: &str = "|";

/// Opaque key identifying the destination record a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive the key for a converted field set.
    ///
    /// When `primary_key` names a field present in `fields`, the key is that
    /// field's string form. Otherwise it is the [content hash](Self::content_hash)
    /// of every field.
    pub fn compute(fields: &Fields, primary_key: Option<&str>) -> Self {
        match primary_key.and_then(|pk| fields.get(pk)) {
            Some(value) => IdentityKey(value.to_string()),
            None => Self::content_hash(fields),
        }
    }

    /// MD5 (hex) over the `name:value` pairs, sorted as strings and joined with `|`.
    ///
    /// Column order never matters; any single differing value changes the key.
    pub fn content_hash(fields: &Fields) -> Self {
        let mut pairs: Vec<String> = fields
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect();
        pairs.sort();

        let digest = Md5::digest(pairs.join(PAIR_SEPARATOR).as_bytes());
        IdentityKey(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        IdentityKey(s.to_string())
    }
}
