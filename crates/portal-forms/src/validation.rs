//! Field validation engine
//!
//! Rules are rebuilt from the current field values every time the form
//! changes and evaluated by [`validate`], a pure function. The result only
//! names fields that are in error; an empty result means the page is valid.

use crate::field::FieldValue;
use portal_core::{Message, Translator};
use regex::Regex;
use std::collections::BTreeMap;

/// Message key used when a required field is blank
pub const FIELD_REQUIRED: &str = "errors:fieldRequired";
/// Message key used when a pattern fails and the rule has no message of its own
pub const INVALID_FORMAT: &str = "errors:invalidFormat";

/// One field's validation rule, evaluated against a value snapshot
#[derive(Debug, Clone)]
pub struct ValidationRule {
    /// Key reported in the result (usually the input id)
    pub field_key: String,
    /// Blank values fail
    pub required: bool,
    /// Non-blank values must match
    pub pattern: Option<Regex>,
    /// Reported when `pattern` fails
    pub pattern_message: Message,
    /// Outcome of a caller-side check (numeric range, remote state, ...)
    pub custom_validation: bool,
    /// Reported when `custom_validation` is true
    pub custom_validation_message: Message,
    /// Value at evaluation time
    pub value: FieldValue,
}

impl ValidationRule {
    /// Rule with no constraints yet
    #[must_use]
    pub fn new(field_key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field_key: field_key.into(),
            required: false,
            pattern: None,
            pattern_message: Message::new(INVALID_FORMAT),
            custom_validation: false,
            custom_validation_message: Message::new(INVALID_FORMAT),
            value: value.into(),
        }
    }

    /// Rule for a field missing from the store: value is empty text
    #[must_use]
    pub fn for_missing(field_key: impl Into<String>) -> Self {
        Self::new(field_key, FieldValue::empty())
    }

    /// Mark as required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require non-blank values to match `pattern`
    #[inline]
    #[must_use]
    pub fn pattern(mut self, pattern: &Regex, message: impl Into<Message>) -> Self {
        self.pattern = Some(pattern.clone());
        self.pattern_message = message.into();
        self
    }

    /// Attach a caller-evaluated check
    #[inline]
    #[must_use]
    pub fn custom(mut self, failed: bool, message: impl Into<Message>) -> Self {
        self.custom_validation = failed;
        self.custom_validation_message = message.into();
        self
    }

    /// Evaluate this rule alone; first failing condition wins
    #[must_use]
    pub fn check(&self) -> Option<Message> {
        let blank = self.value.is_blank();
        if self.required && blank {
            return Some(Message::new(FIELD_REQUIRED));
        }
        if let Some(pattern) = &self.pattern {
            if !blank && !pattern.is_match(&self.value.as_text()) {
                return Some(self.pattern_message.clone());
            }
        }
        if self.custom_validation {
            return Some(self.custom_validation_message.clone());
        }
        None
    }
}

/// Field key → error message, only for fields currently in error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<String, Message>,
}

impl ValidationResult {
    /// No field in error
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `field_key` is in error
    #[inline]
    #[must_use]
    pub fn contains(&self, field_key: &str) -> bool {
        self.errors.contains_key(field_key)
    }

    /// Error for `field_key`
    #[inline]
    #[must_use]
    pub fn get(&self, field_key: &str) -> Option<&Message> {
        self.errors.get(field_key)
    }

    /// Number of fields in error
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Same as [`Self::is_valid`]
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Drop the error shown for `field_key` while the user edits it;
    /// the next [`validate`] run recomputes it.
    #[must_use]
    pub fn clear_field(&self, field_key: &str) -> Self {
        let mut errors = self.errors.clone();
        errors.remove(field_key);
        Self { errors }
    }

    /// Iterate `(field_key, message)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve every message for display
    #[must_use]
    pub fn localize(&self, translator: &dyn Translator) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(k, m)| (k.clone(), m.localize(translator)))
            .collect()
    }
}

/// Evaluate `rules` in order
///
/// Each rule contributes at most one error. When several rules share a
/// field key, the first failing one is kept.
#[must_use]
pub fn validate(rules: &[ValidationRule]) -> ValidationResult {
    let mut errors = BTreeMap::new();
    for rule in rules {
        if errors.contains_key(&rule.field_key) {
            continue;
        }
        if let Some(message) = rule.check() {
            errors.insert(rule.field_key.clone(), message);
        }
    }
    ValidationResult { errors }
}
