//! Live trace viewer
//!
//! Lifecycle: `Idle → Connecting → Streaming → Idle`. A failed connect goes
//! straight back to `Idle`. While streaming, one session task owns the
//! connection and multiplexes three things:
//! - the stop signal from [`TraceViewer::stop`]
//! - the keep-alive timer (`"ok"` every interval)
//! - inbound frames, parsed and appended to the buffer
//!
//! Whatever ends the session (stop, server close, error), the task closes
//! the connection, drops its timer and sets the state to `Idle` before it
//! finishes. `stop` waits for that.

use crate::buffer::TraceBuffer;
use crate::error::StreamError;
use crate::event::TraceEvent;
use crate::filter::TraceFilter;
use crate::transport::{StreamConnector, TraceStream, CLOSE_NORMAL};
use parking_lot::Mutex;
use portal_core::TraceConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Keep-alive frame, also sent right after connecting
pub const KEEPALIVE_MESSAGE: &str = "ok";

/// Viewer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerState {
    /// No connection
    #[default]
    Idle,
    /// Opening the connection
    Connecting,
    /// Receiving events
    Streaming,
}

/// Why the last session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client called `stop`
    Stopped,
    /// Server closed the connection
    ServerClosed,
    /// The connection failed
    Failed(StreamError),
}

#[derive(Debug)]
struct Shared {
    buffer: Mutex<TraceBuffer>,
    state: watch::Sender<ViewerState>,
    last_end: Mutex<Option<SessionEnd>>,
    next_key: AtomicU64,
}

impl Shared {
    fn accept(&self, text: &str) {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        match TraceEvent::parse(text, key) {
            Ok(event) => self.buffer.lock().push(event),
            Err(err) => tracing::warn!(error = %err, "skipping trace message"),
        }
    }

    fn set_state(&self, state: ViewerState) {
        self.state.send_replace(state);
    }
}

#[derive(Debug)]
struct Session {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Streams trace events into a bounded buffer
pub struct TraceViewer {
    connector: Arc<dyn StreamConnector>,
    ws_base_url: String,
    keepalive: Duration,
    shared: Arc<Shared>,
    session: tokio::sync::Mutex<Option<Session>>,
}

impl std::fmt::Debug for TraceViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceViewer")
            .field("ws_base_url", &self.ws_base_url)
            .field("keepalive", &self.keepalive)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl TraceViewer {
    /// Viewer connecting through `connector` with the given settings
    #[must_use]
    pub fn new(connector: Arc<dyn StreamConnector>, config: &TraceConfig) -> Self {
        let (state, _) = watch::channel(ViewerState::Idle);
        let keepalive = if config.keepalive().is_zero() {
            TraceConfig::default().keepalive()
        } else {
            config.keepalive()
        };
        Self {
            connector,
            ws_base_url: config.ws_base_url.clone(),
            keepalive,
            shared: Arc::new(Shared {
                buffer: Mutex::new(TraceBuffer::new(config.buffer_capacity)),
                state,
                last_end: Mutex::new(None),
                next_key: AtomicU64::new(0),
            }),
            session: tokio::sync::Mutex::new(None),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ViewerState {
        *self.shared.state.borrow()
    }

    /// Receiver notified on every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewerState> {
        self.shared.state.subscribe()
    }

    /// Buffered events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.shared.buffer.lock().to_vec()
    }

    /// Number of buffered events
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.buffer.lock().len()
    }

    /// No buffered events
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.buffer.lock().is_empty()
    }

    /// How the last session ended, if one has
    #[must_use]
    pub fn last_end(&self) -> Option<SessionEnd> {
        self.shared.last_end.lock().clone()
    }

    /// Clear the buffer and start streaming events matching `filter`
    ///
    /// # Errors
    /// - `StreamError::AlreadyRunning` unless idle
    /// - `StreamError::Connect` / `StreamError::Send` if the connection
    ///   cannot be opened or greeted; the viewer is idle again
    pub async fn start(&self, filter: &TraceFilter) -> Result<(), StreamError> {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|s| s.task.is_finished()) {
            if let Some(finished) = session.take() {
                if let Err(err) = finished.task.await {
                    tracing::error!(error = %err, "trace session task failed");
                    self.shared.set_state(ViewerState::Idle);
                }
            }
        }
        if self.state() != ViewerState::Idle {
            return Err(StreamError::AlreadyRunning);
        }

        self.shared.buffer.lock().clear();
        *self.shared.last_end.lock() = None;
        self.shared.set_state(ViewerState::Connecting);

        let url = filter.url(&self.ws_base_url);
        tracing::info!(%url, "opening trace stream");
        let mut stream = match self.connector.open(&url).await {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail_start(err)),
        };
        if let Err(err) = stream.send(KEEPALIVE_MESSAGE).await {
            let _ = stream.close(CLOSE_NORMAL).await;
            return Err(self.fail_start(err));
        }

        self.shared.set_state(ViewerState::Streaming);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_session(
            stream,
            Arc::clone(&self.shared),
            self.keepalive,
            stop_rx,
        ));
        *session = Some(Session {
            stop: stop_tx,
            task,
        });
        Ok(())
    }

    /// Close the stream and wait for the session to wind down
    ///
    /// A no-op when idle. When it returns the viewer is idle and no further
    /// keep-alive will be sent.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;
        let Some(current) = session.take() else {
            return;
        };
        let _ = current.stop.send(());
        if let Err(err) = current.task.await {
            tracing::error!(error = %err, "trace session task failed");
            self.shared.set_state(ViewerState::Idle);
        }
    }

    fn fail_start(&self, err: StreamError) -> StreamError {
        tracing::warn!(error = %err, "trace stream could not start");
        *self.shared.last_end.lock() = Some(SessionEnd::Failed(err.clone()));
        self.shared.set_state(ViewerState::Idle);
        err
    }
}

impl Drop for TraceViewer {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.task.abort();
        }
    }
}

async fn run_session(
    mut stream: Box<dyn TraceStream>,
    shared: Arc<Shared>,
    keepalive: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + keepalive, keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            biased;
            _ = &mut stop => break SessionEnd::Stopped,
            _ = ticker.tick() => {
                if let Err(err) = stream.send(KEEPALIVE_MESSAGE).await {
                    break SessionEnd::Failed(err);
                }
            }
            frame = stream.recv() => match frame {
                Some(Ok(text)) => shared.accept(&text),
                Some(Err(err)) => break SessionEnd::Failed(err),
                None => break SessionEnd::ServerClosed,
            },
        }
    };

    drop(ticker);
    if let Err(err) = stream.close(CLOSE_NORMAL).await {
        tracing::debug!(error = %err, "close after session end");
    }
    match &end {
        SessionEnd::Stopped => tracing::info!("trace stream stopped"),
        SessionEnd::ServerClosed => tracing::info!("trace stream closed by server"),
        SessionEnd::Failed(err) => tracing::warn!(error = %err, "trace stream failed"),
    }
    *shared.last_end.lock() = Some(end);
    shared.set_state(ViewerState::Idle);
}
