//! Trace subscription criteria

use portal_core::format::encode_uri_component;
use serde::{Deserialize, Serialize};

/// Call categories to trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CallKinds {
    /// Every category; overrides the others
    pub all: bool,
    /// S3 API calls
    pub s3: bool,
    /// Inter-node calls
    pub internal: bool,
    /// Storage layer calls
    pub storage: bool,
    /// Operating system calls
    pub os: bool,
}

impl Default for CallKinds {
    fn default() -> Self {
        Self {
            all: false,
            s3: true,
            internal: false,
            storage: false,
            os: false,
        }
    }
}

impl CallKinds {
    /// Value of the `calls` parameter; each category keeps its trailing comma
    #[must_use]
    pub fn param(&self) -> String {
        if self.all {
            return "all".to_string();
        }
        [
            (self.s3, "s3,"),
            (self.internal, "internal,"),
            (self.storage, "storage,"),
            (self.os, "os,"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect()
    }
}

/// What the server should stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceFilter {
    /// Call categories
    pub calls: CallKinds,
    /// Only calls slower than this many milliseconds; 0 for all
    pub threshold_ms: u64,
    /// Only failed calls
    pub only_errors: bool,
    /// Exact status code, empty for any
    pub status_code: String,
    /// HTTP method, empty for any
    pub method: String,
    /// API function name, empty for any
    pub func_name: String,
    /// Path substring, empty for any
    pub path: String,
}

impl TraceFilter {
    /// Builder: trace every category
    #[inline]
    #[must_use]
    pub fn all_calls(mut self) -> Self {
        self.calls.all = true;
        self
    }

    /// Builder: only failed calls
    #[inline]
    #[must_use]
    pub fn errors_only(mut self) -> Self {
        self.only_errors = true;
        self
    }

    /// Builder: duration threshold
    #[inline]
    #[must_use]
    pub fn with_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.threshold_ms = threshold_ms;
        self
    }

    /// Builder: path substring
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Query string of the trace endpoint
    #[must_use]
    pub fn query_string(&self) -> String {
        format!(
            "calls={}&threshold={}&onlyErrors={}&statusCode={}&method={}&funcname={}&path={}",
            self.calls.param(),
            self.threshold_ms,
            if self.only_errors { "yes" } else { "no" },
            encode_uri_component(&self.status_code),
            encode_uri_component(&self.method),
            encode_uri_component(&self.func_name),
            encode_uri_component(&self.path),
        )
    }

    /// Full stream URL under `ws_base`, e.g. `ws://localhost:9090`
    #[must_use]
    pub fn url(&self, ws_base: &str) -> String {
        format!(
            "{}/ws/trace?{}",
            ws_base.trim_end_matches('/'),
            self.query_string()
        )
    }
}
