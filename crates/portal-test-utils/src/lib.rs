//! Testing utilities for the portal workspace
//!
//! Fakes for the collaborator seams in `portal-core`:
//! - [`StaticApi`]: canned responses per route, with call recording
//! - [`GatedApi`]: responses released by the test, for ordering races
//! - [`RecordingSink`] / [`RecordingNavigator`]: capture side effects
//! - [`KeyTranslator`]: echoes message keys

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_core::{ApiClient, Catalog, Method, Navigator, NotificationSink, RequestError, Translator};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{oneshot, Notify};

/// One request seen by a fake client
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Client answering from a route table
///
/// Unregistered routes reject with a 404 error.
#[derive(Debug, Default)]
pub struct StaticApi {
    routes: Mutex<HashMap<(Method, String), Result<Value, RequestError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StaticApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `body`
    pub fn with(self, method: Method, path: &str, body: Value) -> Self {
        self.set(method, path, Ok(body));
        self
    }

    /// Reject `method path` with `err`
    pub fn with_error(self, method: Method, path: &str, err: RequestError) -> Self {
        self.set(method, path, Err(err));
        self
    }

    /// Replace the answer of a route
    pub fn set(&self, method: Method, path: &str, answer: Result<Value, RequestError>) {
        self.routes.lock().insert((method, path.to_string()), answer);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.path.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ApiClient for StaticApi {
    async fn invoke(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        self.routes
            .lock()
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(RequestError::new(format!("no route for {method} {path}")).with_status(404))
            })
    }
}

type Reply = oneshot::Sender<Result<Value, RequestError>>;

/// Client whose calls stay pending until the test releases them
///
/// Calls are numbered in arrival order starting at zero.
#[derive(Debug, Default)]
pub struct GatedApi {
    pending: Mutex<Vec<(RecordedCall, Option<Reply>)>>,
    arrived: Notify,
}

impl GatedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until at least `count` calls have arrived
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.pending.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Resolve call `index`; returns false if it was already released or
    /// its caller went away
    pub fn release(&self, index: usize, answer: Result<Value, RequestError>) -> bool {
        let reply = self
            .pending
            .lock()
            .get_mut(index)
            .and_then(|(_, reply)| reply.take());
        reply.is_some_and(|tx| tx.send(answer).is_ok())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.pending.lock().iter().map(|(c, _)| c.clone()).collect()
    }
}

#[async_trait]
impl ApiClient for GatedApi {
    async fn invoke(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push((
            RecordedCall {
                method,
                path: path.to_string(),
                body,
            },
            Some(tx),
        ));
        self.arrived.notify_waiters();
        rx.await
            .unwrap_or_else(|_| Err(RequestError::new("gate dropped")))
    }
}

/// Sink keeping every reported error
#[derive(Debug, Default)]
pub struct RecordingSink {
    errors: Mutex<Vec<RequestError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<RequestError> {
        self.errors.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl NotificationSink for RecordingSink {
    fn report_error(&self, err: &RequestError) {
        self.errors.lock().push(err.clone());
    }
}

/// Navigator keeping every requested route
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}

/// Translator returning the message key, ignoring parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn t(&self, key: &str, _params: &[(&str, &str)]) -> String {
        key.to_string()
    }
}

/// English catalog with the bundled strings
pub fn english_catalog() -> Catalog {
    Catalog::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn static_api_answers_and_records() {
        let api = StaticApi::new().with(Method::Get, "/a", json!({"ok": true}));
        assert_eq!(
            api.invoke(Method::Get, "/a", None).await,
            Ok(json!({"ok": true}))
        );
        let missing = api.invoke(Method::Get, "/b", None).await;
        assert_eq!(missing.map_err(|e| e.status), Err(Some(404)));
        assert_eq!(api.paths(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn gated_api_releases_out_of_order() {
        let api = Arc::new(GatedApi::new());
        let first = tokio::spawn({
            let api = Arc::clone(&api);
            async move { api.invoke(Method::Get, "/x", None).await }
        });
        api.wait_for_calls(1).await;
        let second = tokio::spawn({
            let api = Arc::clone(&api);
            async move { api.invoke(Method::Get, "/x", None).await }
        });
        api.wait_for_calls(2).await;

        assert!(api.release(1, Ok(json!(2))));
        assert_eq!(second.await.ok(), Some(Ok(json!(2))));
        assert!(api.release(0, Ok(json!(1))));
        assert_eq!(first.await.ok(), Some(Ok(json!(1))));
        assert!(!api.release(0, Ok(json!(3))));
    }
}
