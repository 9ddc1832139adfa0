//! Streaming connection seam
//!
//! The viewer only needs a text-frame duplex: open by URL, send text,
//! receive text, close with a code. Any WebSocket client can be wrapped to
//! fit.

use crate::error::StreamError;
use async_trait::async_trait;

/// Normal closure code
pub const CLOSE_NORMAL: u16 = 1000;

/// Opens streaming connections
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Open a connection to `url`
    async fn open(&self, url: &str) -> Result<Box<dyn TraceStream>, StreamError>;
}

/// An open streaming connection
#[async_trait]
pub trait TraceStream: Send {
    /// Send one text frame
    async fn send(&mut self, text: &str) -> Result<(), StreamError>;

    /// Next inbound text frame; `None` once the peer has closed
    ///
    /// Must be cancel-safe: the viewer drops a pending `recv` whenever the
    /// keep-alive fires or the session is stopped.
    async fn recv(&mut self) -> Option<Result<String, StreamError>>;

    /// Close the connection; closing twice is not an error
    async fn close(&mut self, code: u16) -> Result<(), StreamError>;
}
