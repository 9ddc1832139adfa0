//! Error types for trace streaming
//!
//! Stream errors never escape the session task: a failing connection ends
//! the session, returns the viewer to idle and is kept as the viewer's last
//! error. Only `start` returns them directly.

/// Streaming connection errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// `start` while a session is connecting or streaming
    #[error("trace already running")]
    AlreadyRunning,

    /// The connection could not be opened
    #[error("connection failed: {0}")]
    Connect(String),

    /// Writing to the connection failed
    #[error("send failed: {0}")]
    Send(String),

    /// Reading from the connection failed
    #[error("receive failed: {0}")]
    Receive(String),
}

/// A message that could not be turned into a trace event
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Not a trace message
    #[error("invalid trace message: {0}")]
    Json(#[from] serde_json::Error),

    /// Duration in an unknown format
    #[error("invalid duration: {0}")]
    Duration(String),
}
