//! Trace events
//!
//! One streamed JSON message becomes one [`TraceEvent`]. Messages look like:
//!
//! ```json
//! {"time": "2021-06-10 19:36:02.123456 +0000 UTC", "api": "s3.GetObject",
//!  "statusCode": 200, "statusMsg": "OK", "host": "node1:9000",
//!  "client": "10.0.0.5", "callStats": {"duration": "1.5ms", "rx": 0, "tx": 512}}
//! ```

use crate::error::ParseError;
use chrono::{DateTime, Utc};
use portal_core::format::nice_bytes;
use portal_core::Translator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMessage {
    time: String,
    api: String,
    status_code: u16,
    status_msg: String,
    host: String,
    client: String,
    call_stats: RawCallStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCallStats {
    duration: Value,
    rx: u64,
    tx: u64,
}

/// One traced API call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    /// Per-viewer unique key, increasing in arrival order
    pub key: u64,
    /// Parsed call time, if the server's format was understood
    pub time: Option<DateTime<Utc>>,
    /// Call time as sent
    pub raw_time: String,
    /// API name
    pub api: String,
    /// HTTP status code
    pub status_code: u16,
    /// HTTP status text
    pub status_msg: String,
    /// Serving node
    pub host: String,
    /// Calling client
    pub client: String,
    /// Call duration in milliseconds
    pub duration_ms: f64,
    /// Bytes received by the server
    pub bytes_in: u64,
    /// Bytes sent by the server
    pub bytes_out: u64,
}

impl TraceEvent {
    /// Parse a streamed message and tag it with `key`
    ///
    /// # Errors
    /// `ParseError` if the message is not a trace message or its duration is
    /// unreadable. An unreadable time is kept raw instead.
    pub fn parse(text: &str, key: u64) -> Result<Self, ParseError> {
        let raw: RawMessage = serde_json::from_str(text)?;
        let duration_ms = duration_ms(&raw.call_stats.duration)?;
        Ok(Self {
            key,
            time: parse_time(&raw.time),
            raw_time: raw.time,
            api: raw.api,
            status_code: raw.status_code,
            status_msg: raw.status_msg,
            host: raw.host,
            client: raw.client,
            duration_ms,
            bytes_in: raw.call_stats.rx,
            bytes_out: raw.call_stats.tx,
        })
    }

    /// The call failed
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// Parse the server timestamp, e.g. `2021-06-10 19:36:02.1234 +0000 UTC`
#[must_use]
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim().trim_end_matches(" UTC");
    DateTime::parse_from_str(trimmed, TIME_FORMAT)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn duration_ms(value: &Value) -> Result<f64, ParseError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::Duration(n.to_string())),
        Value::String(s) => parse_go_duration(s),
        other => Err(ParseError::Duration(other.to_string())),
    }
}

/// Milliseconds in a Go duration string such as `1h2m3.5s` or `350µs`
///
/// # Errors
/// `ParseError::Duration` on an unknown unit or malformed number.
pub fn parse_go_duration(text: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::Duration(text.to_string());
    let mut rest = text.trim();
    let negative = rest.starts_with('-');
    rest = rest.trim_start_matches(['-', '+']);
    if rest == "0" {
        return Ok(0.0);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = 0.0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let number: f64 = rest[..number_end].parse().map_err(|_| invalid())?;
        rest = &rest[number_end..];
        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1e-6,
            "us" | "µs" | "μs" => 1e-3,
            "ms" => 1.0,
            "s" => 1e3,
            "m" => 60e3,
            "h" => 3600e3,
            _ => return Err(invalid()),
        };
        total += number * scale;
        rest = &rest[unit_end..];
    }
    Ok(if negative { -total } else { total })
}

/// Display form of an event, one string per column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    /// `HH:MM:SS.mmm`, or the raw time when unparsed
    pub time: String,
    /// API name
    pub name: String,
    /// `code message`
    pub status: String,
    /// `host client`
    pub location: String,
    /// Duration
    pub load_time: String,
    /// Bytes received, human readable
    pub upload: String,
    /// Bytes sent, human readable
    pub download: String,
}

impl From<&TraceEvent> for TraceRow {
    fn from(event: &TraceEvent) -> Self {
        Self {
            time: event
                .time
                .map_or_else(|| event.raw_time.clone(), |t| t.format("%H:%M:%S%.3f").to_string()),
            name: event.api.clone(),
            status: format!("{} {}", event.status_code, event.status_msg),
            location: format!("{} {}", event.host, event.client),
            load_time: format_ms(event.duration_ms),
            upload: nice_bytes(event.bytes_in),
            download: nice_bytes(event.bytes_out),
        }
    }
}

fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{ms:.2}ms")
    } else {
        format!("{:.0}µs", ms * 1000.0)
    }
}

/// Localized column headers, in column order
#[must_use]
pub fn column_headers(translator: &dyn Translator) -> [String; 7] {
    [
        "trace:time",
        "trace:name",
        "trace:status",
        "trace:location",
        "trace:loadTime",
        "trace:upload",
        "trace:download",
    ]
    .map(|key| translator.t(key, &[]))
}
