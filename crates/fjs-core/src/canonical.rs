//! # Canonical Serialization — JCS-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation across the workspace.
//!
//! ## Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which serializes with
//! `serde_jcs` (RFC 8785): sorted keys, compact separators, deterministic
//! number formatting.
//!
//! Workspace JSON maps preserve insertion order (`preserve_order`), so plain
//! `serde_json::to_vec` would make a digest depend on the order in which a
//! schema author wrote their keys. JCS removes that dependency.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// RFC 8785 text of a value, held as bytes for hashing.
///
/// Artifact digests and name-collision suffixes are computed over these
/// bytes and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize `value`.
    ///
    /// # Errors
    ///
    /// [`CanonicalizationError::SerializationFailed`] when `value` has no
    /// JSON representation (a map with non-string keys, a non-finite float).
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        Ok(Self(serde_jcs::to_vec(value)?))
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The canonical text. JCS output is always UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True only for an empty serialization, which JCS never produces.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let data = json!({"z": 1, "m": 2, "a": 3});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"a":3,"m":2,"z":1}"#);
    }

    #[test]
    fn nested_objects_are_sorted_arrays_kept() {
        let data = json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn schema_key_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("type".into(), json!("string"));
        first.insert("minLength".into(), json!(1));
        let mut second = serde_json::Map::new();
        second.insert("minLength".into(), json!(1));
        second.insert("type".into(), json!("string"));

        let a = CanonicalBytes::new(&first).unwrap();
        let b = CanonicalBytes::new(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fractional_keyword_values_are_kept() {
        let cb = CanonicalBytes::new(&json!({"multipleOf": 0.01})).unwrap();
        assert!(!cb.is_empty());
        assert_eq!(cb.as_bytes(), br#"{"multipleOf":0.01}"#);
    }
}
