//! Localized strings
//!
//! Every user-facing text in the core is a key into a [`Translator`], never a
//! literal. Keys are `namespace:key`; the part after the first `:` is looked
//! up literally, so dots inside a key are not path separators. Values may
//! carry `{{param}}` placeholders.

use crate::error::PortalError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_NAMESPACE: &str = "common";
const BUILTIN_EN: &str = include_str!("../locales/en.json");
const BUILTIN_FR: &str = include_str!("../locales/fr.json");

/// Resolves message keys into display text
pub trait Translator: Send + Sync {
    /// Translate `key`, substituting `{{name}}` placeholders from `params`
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// A localizable message: key plus interpolation parameters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Message {
    /// `namespace:key`
    pub key: String,
    /// Placeholder values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
}

impl Message {
    /// Message without parameters
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
        }
    }

    /// Add a placeholder value
    #[inline]
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Resolve through a translator
    #[must_use]
    pub fn localize(&self, translator: &dyn Translator) -> String {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        translator.t(&self.key, &params)
    }
}

impl From<&str> for Message {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

type Bundle = HashMap<String, HashMap<String, String>>;

/// In-memory resource bundles with a language fallback chain
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    language: String,
    fallback: Vec<String>,
    bundles: HashMap<String, Bundle>,
}

impl Catalog {
    /// Empty catalog for `language`
    #[must_use]
    pub fn new(language: impl Into<String>, fallback: Vec<String>) -> Self {
        Self {
            language: language.into(),
            fallback,
            bundles: HashMap::new(),
        }
    }

    /// Catalog preloaded with the bundled English and French strings,
    /// English preferred
    #[must_use]
    pub fn builtin() -> Self {
        Self::builtin_for("en", vec!["en".to_string(), "fr".to_string()])
    }

    /// Bundled strings with an explicit language and fallback chain
    #[must_use]
    pub fn builtin_for(language: impl Into<String>, fallback: Vec<String>) -> Self {
        let mut catalog = Self::new(language, fallback);
        for (lang, text) in [("en", BUILTIN_EN), ("fr", BUILTIN_FR)] {
            match serde_json::from_str::<Bundle>(text) {
                Ok(bundle) => catalog.merge(lang, bundle),
                Err(e) => tracing::warn!(language = lang, error = %e, "bundled locale unreadable"),
            }
        }
        catalog
    }

    /// Add a JSON bundle (`{"namespace": {"key": "text"}}`) for `language`
    ///
    /// Keys already present are overwritten.
    ///
    /// # Errors
    /// `PortalError::Locale` if the JSON is not a two-level string map.
    pub fn add_bundle_json(&mut self, language: &str, json: &str) -> Result<(), PortalError> {
        let bundle: Bundle = serde_json::from_str(json)?;
        self.merge(language, bundle);
        Ok(())
    }

    /// Insert a single string
    pub fn insert(&mut self, language: &str, key: &str, text: impl Into<String>) {
        let (ns, key) = split_key(key);
        self.bundles
            .entry(language.to_string())
            .or_default()
            .entry(ns.to_string())
            .or_default()
            .insert(key.to_string(), text.into());
    }

    /// Currently preferred language
    #[inline]
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Switch preferred language
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    fn merge(&mut self, language: &str, bundle: Bundle) {
        let target = self.bundles.entry(language.to_string()).or_default();
        for (ns, entries) in bundle {
            target.entry(ns).or_default().extend(entries);
        }
    }

    fn lookup(&self, language: &str, ns: &str, key: &str) -> Option<&str> {
        self.bundles
            .get(language)
            .and_then(|b| b.get(ns))
            .and_then(|n| n.get(key))
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    fn t(&self, full_key: &str, params: &[(&str, &str)]) -> String {
        let (ns, key) = split_key(full_key);
        let found = std::iter::once(self.language.as_str())
            .chain(self.fallback.iter().map(String::as_str))
            .find_map(|lang| self.lookup(lang, ns, key));

        match found {
            Some(template) => interpolate(template, params),
            None => {
                tracing::debug!(key = full_key, "missing translation");
                key.to_string()
            }
        }
    }
}

fn split_key(full_key: &str) -> (&str, &str) {
    full_key
        .split_once(':')
        .unwrap_or((DEFAULT_NAMESPACE, full_key))
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_resolves_namespaced_key() {
        let catalog = Catalog::builtin();
        let text = catalog.t("errors:fieldRequired", &[]);
        assert_eq!(text, "Field cannot be empty");
    }

    #[test]
    fn missing_key_returns_key_part() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.t("tenants:doesNotExist", &[]), "doesNotExist");
    }

    #[test]
    fn dots_are_literal() {
        let mut catalog = Catalog::new("en", vec![]);
        catalog.insert("en", "common:a.b", "literal");
        assert_eq!(catalog.t("common:a.b", &[]), "literal");
        assert_eq!(catalog.t("a.b", &[]), "literal");
    }

    #[test]
    fn falls_back_through_chain() {
        let mut catalog = Catalog::new("de", vec!["en".to_string()]);
        catalog.insert("en", "users:deleteUser", "Delete User");
        assert_eq!(catalog.t("users:deleteUser", &[]), "Delete User");
    }

    #[test]
    fn preferred_language_wins() {
        let catalog = Catalog::builtin_for("fr", vec!["en".to_string()]);
        assert_eq!(catalog.t("errors:fieldRequired", &[]), "Le champ ne peut pas être vide");
    }

    #[test]
    fn interpolation() {
        let mut catalog = Catalog::new("en", vec![]);
        catalog.insert("en", "users:deleteConfirm", "Delete user {{accessKey}}?");
        let msg = Message::new("users:deleteConfirm").with_param("accessKey", "alice");
        assert_eq!(msg.localize(&catalog), "Delete user alice?");
    }

    #[test]
    fn bundle_json_merges() {
        let mut catalog = Catalog::new("en", vec![]);
        catalog
            .add_bundle_json("en", r#"{"trace": {"start": "Start"}}"#)
            .unwrap();
        catalog
            .add_bundle_json("en", r#"{"trace": {"stop": "Stop"}}"#)
            .unwrap();
        assert_eq!(catalog.t("trace:start", &[]), "Start");
        assert_eq!(catalog.t("trace:stop", &[]), "Stop");
        assert!(catalog.add_bundle_json("en", "[1, 2]").is_err());
    }
}
