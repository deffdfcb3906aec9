//! # Error Hierarchy
//!
//! Structured error types shared across the fjs workspace, built with
//! `thiserror`. No `Box<dyn Error>` in the public surface, no `.unwrap()`
//! outside tests.
//!
//! Subsystem crates (resolver, compiler, artifact loader) define their own
//! error enums and wrap these with `#[from]`.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors while parsing a JSON Pointer (RFC 6901) or a URI fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("invalid JSON pointer \"{0}\": must be empty or start with '/'")]
    MissingLeadingSlash(String),

    /// `~` must be followed by `0` or `1`.
    #[error("invalid JSON pointer \"{pointer}\": bad escape sequence at byte {offset}")]
    InvalidEscape {
        /// The pointer text that failed to parse.
        pointer: String,
        /// Byte offset of the offending `~`.
        offset: usize,
    },

    /// A URI fragment contained an invalid percent-encoding.
    #[error("invalid percent-encoding in fragment \"{0}\"")]
    InvalidPercentEncoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_error_missing_slash_display() {
        let msg = format!("{}", PointerError::MissingLeadingSlash("a/b".to_string()));
        assert!(msg.contains("a/b"));
        assert!(msg.contains("start with '/'"));
    }

    #[test]
    fn pointer_error_invalid_escape_display() {
        let err = PointerError::InvalidEscape {
            pointer: "/a~2".to_string(),
            offset: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("/a~2"));
        assert!(msg.contains("byte 2"));
    }

    #[test]
    fn canonicalization_error_wraps_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CanonicalizationError = source.into();
        assert!(format!("{err}").starts_with("serialization failed"));
    }
}
