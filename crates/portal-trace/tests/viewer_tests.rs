//! Trace viewer lifecycle tests against an in-memory stream

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_core::TraceConfig;
use portal_trace::{
    SessionEnd, StreamConnector, StreamError, TraceFilter, TraceStream, TraceViewer, ViewerState,
    CLOSE_NORMAL, KEEPALIVE_MESSAGE,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

type Frame = Option<Result<String, StreamError>>;

#[derive(Default)]
struct Wire {
    urls: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    closed: Mutex<Vec<u16>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
}

impl Wire {
    fn push(&self, text: &str) {
        self.frame(Some(Ok(text.to_string())));
    }

    fn frame(&self, frame: Frame) {
        let guard = self.inbound.lock();
        let tx = guard.as_ref().expect("no open stream");
        tx.send(frame).expect("stream gone");
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

struct FakeConnector {
    wire: Arc<Wire>,
    refuse: bool,
}

#[async_trait]
impl StreamConnector for FakeConnector {
    async fn open(&self, url: &str) -> Result<Box<dyn TraceStream>, StreamError> {
        self.wire.urls.lock().push(url.to_string());
        if self.refuse {
            return Err(StreamError::Connect("connection refused".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.wire.inbound.lock() = Some(tx);
        Ok(Box::new(FakeStream {
            wire: Arc::clone(&self.wire),
            rx,
        }))
    }
}

struct FakeStream {
    wire: Arc<Wire>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl TraceStream for FakeStream {
    async fn send(&mut self, text: &str) -> Result<(), StreamError> {
        self.wire.sent.lock().push(text.to_string());
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, StreamError>> {
        self.rx.recv().await.flatten()
    }

    async fn close(&mut self, code: u16) -> Result<(), StreamError> {
        self.wire.closed.lock().push(code);
        Ok(())
    }
}

fn viewer(refuse: bool, capacity: usize) -> (TraceViewer, Arc<Wire>) {
    let wire = Arc::new(Wire::default());
    let connector = Arc::new(FakeConnector {
        wire: Arc::clone(&wire),
        refuse,
    });
    let config = TraceConfig {
        ws_base_url: "ws://console:9090".into(),
        keepalive_secs: 10,
        buffer_capacity: capacity,
    };
    (TraceViewer::new(connector, &config), wire)
}

fn message(api: &str) -> String {
    format!(
        r#"{{"time": "2021-06-10 19:36:02.5 +0000 UTC", "api": "{api}", "statusCode": 200,
            "statusMsg": "OK", "callStats": {{"duration": "2ms", "rx": 10, "tx": 20}}}}"#
    )
}

async fn settle(viewer: &TraceViewer, len: usize) {
    for _ in 0..100 {
        if viewer.len() >= len {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("buffer stuck at {} events, wanted {len}", viewer.len());
}

async fn wait_idle(viewer: &TraceViewer) {
    let mut state = viewer.subscribe();
    state
        .wait_for(|s| *s == ViewerState::Idle)
        .await
        .expect("state channel closed");
}

#[tokio::test(start_paused = true)]
async fn streams_events_in_order_until_stopped() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    assert_eq!(viewer.state(), ViewerState::Streaming);
    assert_eq!(
        wire.urls.lock().clone(),
        vec!["ws://console:9090/ws/trace?calls=s3,&threshold=0&onlyErrors=no\
              &statusCode=&method=&funcname=&path="
            .to_string()]
    );
    assert_eq!(wire.sent(), vec![KEEPALIVE_MESSAGE.to_string()]);

    for api in ["s3.ListBuckets", "s3.GetObject", "s3.PutObject"] {
        wire.push(&message(api));
    }
    settle(&viewer, 3).await;
    viewer.stop().await;

    assert_eq!(viewer.state(), ViewerState::Idle);
    assert_eq!(viewer.last_end(), Some(SessionEnd::Stopped));
    assert_eq!(wire.closed.lock().clone(), vec![CLOSE_NORMAL]);

    let events = viewer.events();
    let apis: Vec<&str> = events.iter().map(|e| e.api.as_str()).collect();
    assert_eq!(apis, vec!["s3.ListBuckets", "s3.GetObject", "s3.PutObject"]);
    assert!(events.windows(2).all(|w| w[0].key < w[1].key));
}

#[tokio::test(start_paused = true)]
async fn keepalive_every_interval_while_streaming() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(wire.sent().len(), 3);
    assert!(wire.sent().iter().all(|m| m == KEEPALIVE_MESSAGE));

    viewer.stop().await;
}

#[tokio::test(start_paused = true)]
async fn no_keepalive_after_stop() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    viewer.stop().await;
    let sent_at_stop = wire.sent().len();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(wire.sent().len(), sent_at_stop);
    assert_eq!(viewer.state(), ViewerState::Idle);
}

#[tokio::test]
async fn stop_when_idle_is_noop() {
    let (viewer, wire) = viewer(false, 100);
    viewer.stop().await;
    assert_eq!(viewer.state(), ViewerState::Idle);
    assert_eq!(viewer.last_end(), None);
    assert!(wire.urls.lock().is_empty());
}

#[tokio::test]
async fn refused_connection_returns_to_idle() {
    let (viewer, wire) = viewer(true, 100);
    let err = viewer.start(&TraceFilter::default()).await.unwrap_err();
    assert!(matches!(err, StreamError::Connect(_)));
    assert_eq!(viewer.state(), ViewerState::Idle);
    assert!(matches!(viewer.last_end(), Some(SessionEnd::Failed(_))));
    assert!(wire.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_start_rejected_while_streaming() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    let err = viewer.start(&TraceFilter::default()).await.unwrap_err();
    assert_eq!(err, StreamError::AlreadyRunning);
    assert_eq!(wire.urls.lock().len(), 1);
    viewer.stop().await;
}

#[tokio::test(start_paused = true)]
async fn server_close_ends_session_and_restart_clears() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    wire.push(&message("s3.ListBuckets"));
    settle(&viewer, 1).await;

    wire.frame(None);
    wait_idle(&viewer).await;
    assert_eq!(viewer.last_end(), Some(SessionEnd::ServerClosed));
    assert_eq!(viewer.len(), 1);

    viewer
        .start(&TraceFilter::default().errors_only())
        .await
        .unwrap();
    assert!(viewer.is_empty());
    assert!(wire.urls.lock()[1].contains("onlyErrors=yes"));

    wire.push(&message("s3.HeadObject"));
    settle(&viewer, 1).await;
    let event = &viewer.events()[0];
    assert_eq!(event.api, "s3.HeadObject");
    assert!(event.key > 0);
    viewer.stop().await;
}

#[tokio::test(start_paused = true)]
async fn receive_error_fails_session() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    wire.frame(Some(Err(StreamError::Receive("reset by peer".into()))));
    wait_idle(&viewer).await;
    assert_eq!(
        viewer.last_end(),
        Some(SessionEnd::Failed(StreamError::Receive("reset by peer".into())))
    );
    assert_eq!(wire.closed.lock().clone(), vec![CLOSE_NORMAL]);
    viewer.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unreadable_messages_skipped() {
    let (viewer, wire) = viewer(false, 100);
    viewer.start(&TraceFilter::default()).await.unwrap();
    wire.push("not json");
    wire.push(r#"{"api": "s3.GetObject", "callStats": {"duration": "forever"}}"#);
    wire.push(&message("s3.PutObject"));
    settle(&viewer, 1).await;
    viewer.stop().await;

    let events = viewer.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].api, "s3.PutObject");
}

#[tokio::test(start_paused = true)]
async fn buffer_keeps_most_recent() {
    let (viewer, wire) = viewer(false, 2);
    viewer.start(&TraceFilter::default()).await.unwrap();
    for api in ["a", "b", "c"] {
        wire.push(&message(api));
    }
    // Capacity caps len at 2, so wait for the last message to land.
    for _ in 0..100 {
        if viewer.events().last().is_some_and(|e| e.api == "c") {
            break;
        }
        tokio::task::yield_now().await;
    }
    viewer.stop().await;

    let apis: Vec<String> = viewer.events().into_iter().map(|e| e.api).collect();
    assert_eq!(apis, vec!["b".to_string(), "c".to_string()]);
}

/// First connection yields a stream whose reader panics; later ones are sound
struct CrashingOnceConnector {
    wire: Arc<Wire>,
    crashed: Mutex<bool>,
}

struct CrashingStream;

#[async_trait]
impl TraceStream for CrashingStream {
    async fn send(&mut self, _text: &str) -> Result<(), StreamError> {
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, StreamError>> {
        panic!("reader crashed");
    }

    async fn close(&mut self, _code: u16) -> Result<(), StreamError> {
        Ok(())
    }
}

#[async_trait]
impl StreamConnector for CrashingOnceConnector {
    async fn open(&self, url: &str) -> Result<Box<dyn TraceStream>, StreamError> {
        let first = !std::mem::replace(&mut *self.crashed.lock(), true);
        if first {
            return Ok(Box::new(CrashingStream));
        }
        FakeConnector {
            wire: Arc::clone(&self.wire),
            refuse: false,
        }
        .open(url)
        .await
    }
}

#[tokio::test(start_paused = true)]
async fn crashed_session_is_reaped_on_next_start() {
    let wire = Arc::new(Wire::default());
    let connector = Arc::new(CrashingOnceConnector {
        wire: Arc::clone(&wire),
        crashed: Mutex::new(false),
    });
    let config = TraceConfig {
        ws_base_url: "ws://console:9090".into(),
        keepalive_secs: 10,
        buffer_capacity: 10,
    };
    let viewer = TraceViewer::new(connector, &config);

    viewer.start(&TraceFilter::default()).await.unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    // The crashed task never got to mark the viewer idle.
    assert_eq!(viewer.state(), ViewerState::Streaming);

    viewer.start(&TraceFilter::default()).await.unwrap();
    assert_eq!(viewer.state(), ViewerState::Streaming);
    wire.push(&message("s3.GetObject"));
    settle(&viewer, 1).await;
    viewer.stop().await;
    assert_eq!(viewer.state(), ViewerState::Idle);
}
