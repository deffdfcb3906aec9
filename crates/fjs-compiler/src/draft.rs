//! JSON Schema draft selection.
//!
//! The dialect is taken from the root document's `$schema` when it names a
//! known draft, otherwise from [`CompileOptions::default_draft`](crate::CompileOptions).
//! One draft governs the whole compilation, including retrieved documents.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported JSON Schema dialects.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Draft {
    /// Draft 4 (`id`, boolean `exclusiveMinimum`).
    Draft4,
    /// Draft 6 (`$id`, `const`, `contains`, `propertyNames`, numeric exclusive bounds).
    Draft6,
    /// Draft 7 (`if`/`then`/`else`).
    #[default]
    Draft7,
}

impl Draft {
    /// Identify the draft named by a `$schema` URI.
    pub fn from_meta_schema(uri: &str) -> Option<Self> {
        let trimmed = uri.trim_end_matches('#');
        let trimmed = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .unwrap_or(trimmed);
        match trimmed {
            "json-schema.org/draft-04/schema" => Some(Self::Draft4),
            "json-schema.org/draft-06/schema" => Some(Self::Draft6),
            "json-schema.org/draft-07/schema" => Some(Self::Draft7),
            _ => None,
        }
    }

    /// The draft declared by a root schema's `$schema`, if any.
    pub fn detect(schema: &Value) -> Option<Self> {
        schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_meta_schema)
    }

    /// Keyword that declares a schema's base URI.
    pub fn id_keyword(&self) -> &'static str {
        match self {
            Self::Draft4 => "id",
            Self::Draft6 | Self::Draft7 => "$id",
        }
    }

    /// Whether a float with no fractional part satisfies `"type": "integer"`.
    pub fn integral_floats_are_integers(&self) -> bool {
        !matches!(self, Self::Draft4)
    }

    /// Whether this draft defines `keyword`.
    ///
    /// Keywords a draft does not define are ignored, like any unknown keyword.
    pub fn supports(&self, keyword: &str) -> bool {
        match keyword {
            "const" | "contains" | "propertyNames" => *self >= Self::Draft6,
            "if" | "then" | "else" => *self >= Self::Draft7,
            _ => true,
        }
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft4 => "draft4",
            Self::Draft6 => "draft6",
            Self::Draft7 => "draft7",
        })
    }
}
