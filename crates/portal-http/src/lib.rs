//! Portal HTTP - backend client over HTTP
//!
//! [`HttpApiClient`] implements [`ApiClient`] with `reqwest`:
//! - Paths are joined onto the configured base URL
//! - Bodies are sent and received as JSON; an empty body reads as `null`
//! - Non-2xx responses become a [`RequestError`] carrying the backend's
//!   `message` / `detailedMessage` and the status code
//! - Transport failures become a [`RequestError`] without a status

#![warn(unreachable_pub)]

use async_trait::async_trait;
use portal_core::{ApiClient, ApiConfig, Method, RequestError};
use serde::Deserialize;
use serde_json::Value;

/// Error body returned by the console backend
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    detailed_message: Option<String>,
}

/// [`ApiClient`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    /// Client for the backend described by `config`
    ///
    /// # Errors
    /// `RequestError` if the underlying client cannot be built (TLS setup).
    pub fn new(config: &ApiConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RequestError::new("cannot build http client").with_detail(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn invoke(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let url = self.url(path);
        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = &body {
            request = request.json(body);
        }

        tracing::debug!(%method, %url, "api request");
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &text);
            tracing::warn!(%method, %url, status = status.as_u16(), error = %err, "api request rejected");
            return Err(err);
        }
        parse_body(&text)
    }
}

fn transport_error(err: reqwest::Error) -> RequestError {
    let message = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "cannot reach the server"
    } else {
        "request failed"
    };
    RequestError::new(message).with_detail(err.to_string())
}

/// Decode a successful response body; empty reads as `null`
///
/// # Errors
/// `RequestError` if the body is not JSON.
pub fn parse_body(text: &str) -> Result<Value, RequestError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| RequestError::new("malformed server response").with_detail(e.to_string()))
}

/// Build the error for a rejected request from its status and body
#[must_use]
pub fn error_from_body(status: u16, text: &str) -> RequestError {
    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
    let message = body
        .message
        .filter(|m| !m.is_empty())
        .or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"));
    let mut err = RequestError::new(message).with_status(status);
    err.detail = body.detailed_message.filter(|d| !d.is_empty());
    err
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
