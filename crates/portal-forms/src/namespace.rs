//! Namespace probing for the tenant name step
//!
//! When the user types a namespace, the console checks whether it already
//! hosts a tenant and which storage classes its quota grants. Probes are
//! debounced; a newer keystroke aborts the pending probe so a slow answer for
//! an old namespace can never overwrite the status of the current one.

use crate::debounce::Debouncer;
use crate::tenant::NamespaceStatus;
use parking_lot::Mutex;
use portal_core::{ApiClient, Method, NotificationSink, RequestError, Translator};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const STORAGE_CLASS_SUFFIX: &str = ".storageclass.storage.k8s.io/requests.storage";

/// Queries the backend about a namespace
#[derive(Clone)]
pub struct NamespaceProbe {
    api: Arc<dyn ApiClient>,
    sink: Arc<dyn NotificationSink>,
    translator: Arc<dyn Translator>,
}

impl std::fmt::Debug for NamespaceProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceProbe").finish_non_exhaustive()
    }
}

impl NamespaceProbe {
    /// Probe backed by the given collaborators
    #[must_use]
    pub fn new(
        api: Arc<dyn ApiClient>,
        sink: Arc<dyn NotificationSink>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            api,
            sink,
            translator,
        }
    }

    /// Determine the status of `namespace`
    ///
    /// # Errors
    /// Returns the request error when the tenant listing fails; it has
    /// already been reported to the notification sink.
    pub async fn probe(&self, namespace: &str) -> Result<NamespaceStatus, RequestError> {
        let tenants_path = format!("/api/v1/namespaces/{namespace}/tenants");
        let tenants = match self.api.invoke(Method::Get, &tenants_path, None).await {
            Ok(body) => body,
            Err(err) => {
                let mut reported =
                    RequestError::new(self.translator.t("tenants:namespaceValidationErr", &[]));
                reported.detail = err.detail.clone().or_else(|| Some(err.message.clone()));
                reported.status = err.status;
                self.sink.report_error(&reported);
                return Err(err);
            }
        };

        let occupied = tenants
            .get("tenants")
            .and_then(Value::as_array)
            .is_some_and(|list| !list.is_empty());
        if occupied {
            tracing::debug!(%namespace, "namespace already hosts a tenant");
            return Ok(NamespaceStatus::Occupied);
        }

        let quota_path =
            format!("/api/v1/namespaces/{namespace}/resourcequotas/{namespace}-storagequota");
        match self.api.invoke(Method::Get, &quota_path, None).await {
            Ok(quota) => Ok(NamespaceStatus::Available(storage_classes(&quota))),
            Err(err) => {
                tracing::warn!(%namespace, error = %err, "namespace quota unavailable");
                Ok(NamespaceStatus::Missing)
            }
        }
    }

    /// Create `namespace`; failures are reported to the sink
    ///
    /// # Errors
    /// The request error, already reported.
    pub async fn create_namespace(&self, namespace: &str) -> Result<(), RequestError> {
        let body = json!({ "name": namespace });
        match self
            .api
            .invoke(Method::Post, "/api/v1/namespace", Some(body))
            .await
        {
            Ok(_) => {
                tracing::info!(%namespace, "namespace created");
                Ok(())
            }
            Err(err) => {
                self.sink.report_error(&err);
                Err(err)
            }
        }
    }
}

/// Storage class names granted by a resource quota response
#[must_use]
pub fn storage_classes(quota: &Value) -> Vec<String> {
    quota
        .get("elements")
        .and_then(Value::as_array)
        .map(|elements| {
            elements
                .iter()
                .filter_map(|e| e.get("name").and_then(Value::as_str))
                .map(|name| {
                    name.split(STORAGE_CLASS_SUFFIX)
                        .next()
                        .unwrap_or(name)
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Debounced namespace probing with a watchable outcome
///
/// Every [`NamespaceWatcher::namespace_changed`] call supersedes the
/// previous one. The latest status is published on a watch channel; an
/// empty namespace publishes [`NamespaceStatus::Loading`] without probing.
///
/// Each change opens a new generation. A probe only publishes while its
/// generation is still current, checked under the same lock that opens the
/// next one.
#[derive(Debug)]
pub struct NamespaceWatcher {
    probe: NamespaceProbe,
    debouncer: Debouncer,
    status: watch::Sender<NamespaceStatus>,
    generation: Arc<Mutex<u64>>,
}

impl NamespaceWatcher {
    /// Watcher probing after `delay` of quiescence
    #[must_use]
    pub fn new(probe: NamespaceProbe, delay: Duration) -> Self {
        let (status, _) = watch::channel(NamespaceStatus::Loading);
        Self {
            probe,
            debouncer: Debouncer::new(delay),
            status,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Receiver of the latest status
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NamespaceStatus> {
        self.status.subscribe()
    }

    /// The namespace input changed
    pub fn namespace_changed(&self, namespace: &str) {
        self.debouncer.cancel();
        let generation = {
            let mut current = self.generation.lock();
            *current += 1;
            self.status.send_replace(NamespaceStatus::Loading);
            *current
        };
        if namespace.is_empty() {
            return;
        }
        self.schedule(namespace.to_string(), generation);
    }

    /// Probe again immediately after the delay, e.g. after creating the
    /// namespace
    pub fn refresh(&self, namespace: &str) {
        self.namespace_changed(namespace);
    }

    /// Stop any pending probe
    pub fn cancel(&self) {
        self.debouncer.cancel();
        *self.generation.lock() += 1;
    }

    fn schedule(&self, namespace: String, generation: u64) {
        let probe = self.probe.clone();
        let status = self.status.clone();
        let current = Arc::clone(&self.generation);
        self.debouncer.call(async move {
            let Ok(result) = probe.probe(&namespace).await else {
                return;
            };
            let current = current.lock();
            if *current == generation {
                status.send_replace(result);
            } else {
                tracing::debug!(%namespace, "dropping status of superseded namespace");
            }
        });
    }
}
