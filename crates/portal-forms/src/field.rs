//! Field values bound to a (step, field) key

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value held by one form field
///
/// Scalars cover almost every input; `List` backs repeated inputs such as
/// generated access keys or LDAP user DNs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Checkbox/switch
    Bool(bool),
    /// Numeric input
    Number(f64),
    /// Text input or select
    Text(String),
    /// Repeated text inputs
    List(Vec<String>),
}

impl FieldValue {
    /// Empty text value
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// A value is blank when it carries no user input: whitespace-only
    /// text, or a list whose entries are all blank. Numbers and booleans
    /// are never blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Text view used for pattern matching and display
    #[must_use]
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Borrow the text, if this is a text value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view; non-boolean values read as `false`
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Option offered by a select input, e.g. a storage class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    /// Display label
    pub label: String,
    /// Submitted value
    pub value: String,
}

impl SelectOption {
    /// Option whose label equals its value
    #[inline]
    #[must_use]
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}
