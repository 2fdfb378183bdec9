use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Top-level JSON shape a document is required to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

/// The fixed set of documents a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    /// The child's profile, a single object.
    UserProfile,
    /// Completed activities, appended over time.
    Activities,
    /// Per-skill progress scores, a single object.
    Progress,
    /// Feedback entries, appended over time.
    Feedback,
    /// Feed items and bookmarks, appended over time.
    Feed,
}

impl DocumentKind {
    pub const ALL: [Self; 5] = [
        Self::UserProfile,
        Self::Activities,
        Self::Progress,
        Self::Feedback,
        Self::Feed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserProfile => "userprofile",
            Self::Activities => "activities",
            Self::Progress => "progress",
            Self::Feedback => "feedback",
            Self::Feed => "feed",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    pub fn shape(self) -> Shape {
        match self {
            Self::UserProfile | Self::Progress => Shape::Object,
            Self::Activities | Self::Feedback | Self::Feed => Shape::Array,
        }
    }

    /// Value returned when the document has never been written.
    pub fn empty(self) -> Value {
        match self.shape() {
            Shape::Object => Value::Object(Map::new()),
            Shape::Array => Value::Array(Vec::new()),
        }
    }

    /// Check that `value` has this kind's top-level shape.
    pub fn check_shape(self, value: &Value) -> Result<(), StoreError> {
        let ok = match self.shape() {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::Shape {
                kind: self,
                expected: self.shape(),
                found: json_type_name(value),
            })
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StoreError::UnknownKind(s.to_string()))
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
