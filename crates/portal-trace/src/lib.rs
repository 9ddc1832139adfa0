//! Portal Trace - live API call tracing
//!
//! Headless trace screen:
//! - Subscription criteria rendered to the trace endpoint URL ([`TraceFilter`])
//! - A connection seam any WebSocket client can implement ([`StreamConnector`])
//! - A viewer that keeps the connection alive and buffers parsed events
//!   ([`TraceViewer`])
//! - Row rendering for the events table ([`TraceRow`])
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_trace::{TraceFilter, TraceViewer};
//!
//! let viewer = TraceViewer::new(connector, &config.trace);
//! viewer.start(&TraceFilter::default().errors_only()).await?;
//! // ...
//! viewer.stop().await;
//! for event in viewer.events() {
//!     println!("{} {}", event.api, event.status_code);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod buffer;
pub mod error;
pub mod event;
pub mod filter;
pub mod transport;
pub mod viewer;

pub use buffer::TraceBuffer;
pub use error::{ParseError, StreamError};
pub use event::{column_headers, TraceEvent, TraceRow};
pub use filter::{CallKinds, TraceFilter};
pub use transport::{StreamConnector, TraceStream, CLOSE_NORMAL};
pub use viewer::{SessionEnd, TraceViewer, ViewerState, KEEPALIVE_MESSAGE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
