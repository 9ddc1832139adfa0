//! Backend request seam
//!
//! The console never talks to the network directly; every screen goes through
//! an [`ApiClient`], so controllers can be built against fakes in tests.

use crate::error::RequestError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP verbs used by the console API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read
    Get,
    /// Create
    Post,
    /// Replace/update
    Put,
    /// Remove
    Delete,
}

impl Method {
    /// Upper-case wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request function consumed by every controller
///
/// Resolves to the parsed JSON body, or rejects with a [`RequestError`].
/// An empty response body resolves to `Value::Null`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Issue a request against the console backend
    async fn invoke(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_wire_names() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
