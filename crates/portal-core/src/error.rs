//! Error types for the console core
//!
//! Provides error handling for:
//! - Backend/network rejections of a request
//! - Configuration loading failures
//!
//! Validation failures are not errors here: they are values produced by the
//! form validation engine and rendered next to the offending field.

use serde::{Deserialize, Serialize};

/// A rejected backend request
///
/// Mirrors the `{errorMessage, detailedError}` shape the console surfaces in
/// its error snackbar. Never fatal: the screen stays usable and the user may
/// retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    /// Short, user-facing message
    pub message: String,
    /// Optional detail returned by the backend
    pub detail: Option<String>,
    /// HTTP status, when the request reached the server
    pub status: Option<u16>,
}

impl RequestError {
    /// Create a request error with a short message only
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            status: None,
        }
    }

    /// With backend detail
    #[inline]
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// With HTTP status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Transport failures and server-side errors may succeed on retry;
    /// client errors (4xx) will not.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(code) => code >= 500 || code == 429,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config content is not valid TOML for [`crate::PortalConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Umbrella error for front-ends wiring several crates together
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Backend request failed
    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    /// Configuration failed to load
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Localization bundle could not be parsed
    #[error("locale bundle error: {0}")]
    Locale(#[from] serde_json::Error),
}
