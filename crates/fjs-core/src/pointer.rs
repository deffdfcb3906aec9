//! # JSON Pointer (RFC 6901)
//!
//! A [`JsonPointer`] is stored as its decoded reference tokens. Parsing
//! handles both the plain pointer syntax (`/properties/a~1b`) and the URI
//! fragment form (`#/properties/a~1b`, percent-encoded), so every spelling of
//! the same location produces an equal value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PointerError;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse pointer text such as `/definitions/node`.
    ///
    /// # Errors
    ///
    /// Returns `PointerError` if the text is non-empty without a leading `/`
    /// or contains a `~` not followed by `0` or `1`.
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(text.to_string()));
        };
        let mut tokens = Vec::new();
        let mut offset = 1;
        for raw in rest.split('/') {
            tokens.push(unescape_token(raw).ok_or_else(|| PointerError::InvalidEscape {
                pointer: text.to_string(),
                offset: offset + raw.find('~').unwrap_or(0),
            })?);
            offset += raw.len() + 1;
        }
        Ok(Self { tokens })
    }

    /// Parse a URI fragment (without the leading `#`), percent-decoding first.
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode(fragment)
            .ok_or_else(|| PointerError::InvalidPercentEncoding(fragment.to_string()))?;
        Self::parse(&decoded)
    }

    /// Returns a new pointer with `token` appended.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Returns a new pointer with all of `other`'s tokens appended.
    pub fn concat(&self, other: &JsonPointer) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }

    /// The decoded reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True for the root pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Look up the value this pointer addresses within `document`.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(parse_index(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl From<JsonPointer> for String {
    fn from(pointer: JsonPointer) -> Self {
        pointer.to_string()
    }
}

impl TryFrom<String> for JsonPointer {
    type Error = PointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

fn unescape_token(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array indices: decimal digits, no leading zeros (except `0` itself).
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
