//! Console configuration
//!
//! Defines the tunables of the console core:
//! - Backend endpoint and request timeout
//! - Trace streaming (keep-alive interval, buffer bound)
//! - Form behavior (namespace probe debounce)
//! - Locale selection and fallback chain

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PortalConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Live trace settings
    pub trace: TraceConfig,
    /// Form/wizard settings
    pub forms: FormsConfig,
    /// Localization settings
    pub locale: LocaleConfig,
}

impl PortalConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// With trace keep-alive interval in seconds
    #[inline]
    #[must_use]
    pub fn with_keepalive_secs(mut self, secs: u64) -> Self {
        self.trace.keepalive_secs = secs;
        self
    }

    /// With trace buffer capacity
    #[inline]
    #[must_use]
    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace.buffer_capacity = capacity;
        self
    }

    /// With UI language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.locale.language = language.into();
        self
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` on zero intervals/capacities
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Same as [`Self::from_toml_str`], plus `ConfigError::Read`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values that would stall or disable a subsystem
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trace.keepalive_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "trace.keepalive_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.trace.buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "trace.buffer_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "api.request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the console backend, e.g. `http://localhost:9090`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Live trace settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Base URL of the trace socket, e.g. `ws://localhost:9090`
    pub ws_base_url: String,
    /// Interval between client keep-alive messages
    pub keepalive_secs: u64,
    /// Maximum retained trace events; oldest are dropped first
    pub buffer_capacity: usize,
}

impl TraceConfig {
    /// Keep-alive interval as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            ws_base_url: "ws://localhost:9090".to_string(),
            keepalive_secs: 10,
            buffer_capacity: 5000,
        }
    }
}

/// Form/wizard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Quiescence delay before probing a typed namespace
    pub namespace_debounce_ms: u64,
}

impl FormsConfig {
    /// Debounce delay as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn namespace_debounce(&self) -> Duration {
        Duration::from_millis(self.namespace_debounce_ms)
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            namespace_debounce_ms: 500,
        }
    }
}

/// Localization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Preferred language
    pub language: String,
    /// Languages tried, in order, when a key is missing
    pub fallback: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            fallback: vec!["en".to_string(), "fr".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_console() {
        let config = PortalConfig::new();
        assert_eq!(config.trace.keepalive(), Duration::from_secs(10));
        assert_eq!(config.forms.namespace_debounce(), Duration::from_millis(500));
        assert_eq!(config.locale.fallback, vec!["en", "fr"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PortalConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://console.example.com"

            [trace]
            buffer_capacity = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://console.example.com");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.trace.buffer_capacity, 100);
        assert_eq!(config.trace.keepalive_secs, 10);
    }

    #[test]
    fn zero_keepalive_rejected() {
        let err = PortalConfig::from_toml_str("[trace]\nkeepalive_secs = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "trace.keepalive_secs",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = PortalConfig::from_toml_str("[trace\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builder_methods() {
        let config = PortalConfig::new()
            .with_base_url("http://10.0.0.1:9090")
            .with_keepalive_secs(5)
            .with_trace_capacity(10)
            .with_language("fr");
        assert_eq!(config.api.base_url, "http://10.0.0.1:9090");
        assert_eq!(config.trace.keepalive_secs, 5);
        assert_eq!(config.trace.buffer_capacity, 10);
        assert_eq!(config.locale.language, "fr");
    }
}
