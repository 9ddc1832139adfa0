//! Notification sink for request failures

use crate::error::RequestError;

/// Shared sink surfacing request failures to the user
pub trait NotificationSink: Send + Sync {
    /// Report a failed request
    fn report_error(&self, err: &RequestError);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn report_error(&self, err: &RequestError) {
        tracing::error!(
            message = %err.message,
            detail = err.detail.as_deref().unwrap_or(""),
            status = err.status,
            "request failed"
        );
    }
}
