//! Typed value codec for the document store wire format
//!
//! Firestore's REST API wraps every field in a type tag, e.g.
//! `{"stringValue": "pasta"}`, and carries integers as decimal
//! strings. The externally tagged enum below serializes to exactly
//! that shape.

use std::collections::BTreeMap;

/// One typed field value
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    StringValue(String),
    /// Integers travel as decimal strings on the wire
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    /// RFC 3339 instant
    TimestampValue(String),
    ArrayValue {
        #[serde(default)]
        values: Vec<Value>,
    },
    MapValue {
        #[serde(default)]
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::StringValue(s.into())
    }

    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::IntegerValue(n.to_string())
    }

    #[must_use]
    pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> Self {
        Self::TimestampValue(at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }

    #[must_use]
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::ArrayValue {
            values: items.into_iter().map(|s| Self::string(s)).collect(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// String items of an array value; non-string items are skipped
    #[must_use]
    pub fn as_string_array(&self) -> Option<Vec<String>> {
        match self {
            Self::ArrayValue { values } => Some(
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(ToString::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Field map of one stored document
pub type Fields = BTreeMap<String, Value>;
