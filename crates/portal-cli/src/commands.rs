//! Subcommand bodies
//!
//! Argument parsing lives in `main`; everything here takes plain values so
//! it can run against fake backends.

use anyhow::{bail, Result};
use portal_core::format::nice_bytes;
use portal_core::{ApiClient, NotificationSink, Translator};
use portal_forms::{steps, NamespaceStatus, TenantWizard};
use portal_lists::resources::{Bucket, Drive, Policy, ServiceAccount, ServiceAccountSource, User};
use portal_lists::{
    ApiSource, Entity, EntityListController, EntitySource, ListQuery, LoadOutcome, Resource,
    SortOrder,
};
use serde::Serialize;
use std::sync::Arc;

/// Collections `portal list` can show
pub(crate) const KINDS: [&str; 5] = ["buckets", "users", "policies", "service-accounts", "drives"];

/// Table columns of a listed entity
pub(crate) trait Columns {
    fn headers() -> &'static [&'static str];
    fn columns(&self) -> Vec<String>;
}

impl Columns for Bucket {
    fn headers() -> &'static [&'static str] {
        &["NAME", "SIZE", "CREATED"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.size.map(nice_bytes).unwrap_or_default(),
            self.creation_date.clone().unwrap_or_default(),
        ]
    }
}

impl Columns for User {
    fn headers() -> &'static [&'static str] {
        &["ACCESS KEY", "STATUS", "POLICIES"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.access_key.clone(),
            self.status.clone(),
            self.policy.join(","),
        ]
    }
}

impl Columns for Policy {
    fn headers() -> &'static [&'static str] {
        &["NAME"]
    }

    fn columns(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

impl Columns for ServiceAccount {
    fn headers() -> &'static [&'static str] {
        &["SERVICE ACCOUNT"]
    }

    fn columns(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

impl Columns for Drive {
    fn headers() -> &'static [&'static str] {
        &["NODE", "DRIVE", "CAPACITY", "ALLOCATED", "STATUS"]
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.node.clone(),
            self.drive.clone(),
            nice_bytes(self.capacity),
            nice_bytes(self.allocated),
            self.status.clone(),
        ]
    }
}

/// Row order named on the command line
pub(crate) fn sort_order<E>(name: &str) -> SortOrder<E> {
    match name {
        "asc" => SortOrder::DisplayAsc,
        "desc" => SortOrder::DisplayDesc,
        _ => SortOrder::Source,
    }
}

/// Load one collection and return the filtered, sorted view
pub(crate) async fn fetch<E: Entity>(
    source: Arc<dyn EntitySource<E>>,
    sink: Arc<dyn NotificationSink>,
    filter: &str,
    order: &str,
) -> Result<Vec<E>> {
    let list = EntityListController::new(source, sink);
    match list.load().await {
        LoadOutcome::Applied(count) => tracing::debug!(count, "loaded"),
        LoadOutcome::Failed(err) => match err.detail {
            Some(detail) => bail!("{}: {detail}", err.message),
            None => bail!("{}", err.message),
        },
        other => bail!("list load did not complete: {other:?}"),
    }
    Ok(list.view(&ListQuery::filtered(filter).sorted(sort_order(order))))
}

/// Tab-separated table, header first
pub(crate) fn render_table<E: Columns>(items: &[E]) -> Vec<String> {
    std::iter::once(E::headers().join("\t"))
        .chain(items.iter().map(|item| item.columns().join("\t")))
        .collect()
}

/// Fetch and render one collection, as a table or as JSON
pub(crate) async fn list_kind(
    kind: &str,
    api: Arc<dyn ApiClient>,
    sink: Arc<dyn NotificationSink>,
    filter: &str,
    order: &str,
    json: bool,
) -> Result<Vec<String>> {
    match kind {
        "buckets" => render(fetch(resource::<Bucket>(api), sink, filter, order).await?, json),
        "users" => render(fetch(resource::<User>(api), sink, filter, order).await?, json),
        "policies" => render(fetch(resource::<Policy>(api), sink, filter, order).await?, json),
        "service-accounts" => {
            let source: Arc<dyn EntitySource<ServiceAccount>> =
                Arc::new(ServiceAccountSource::new(api));
            render(fetch(source, sink, filter, order).await?, json)
        }
        "drives" => render(fetch(resource::<Drive>(api), sink, filter, order).await?, json),
        other => bail!("unknown collection {other:?}, expected one of {KINDS:?}"),
    }
}

fn resource<E: Resource>(api: Arc<dyn ApiClient>) -> Arc<dyn EntitySource<E>> {
    Arc::new(ApiSource::<E>::for_resource(api))
}

fn render<E: Columns + Serialize>(items: Vec<E>, json: bool) -> Result<Vec<String>> {
    if json {
        Ok(vec![serde_json::to_string_pretty(&items)?])
    } else {
        Ok(render_table(&items))
    }
}

/// Outcome of `portal validate-tenant`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TenantCheck {
    /// Every checked rule passed
    pub(crate) valid: bool,
    /// Localized `field: message` lines, sorted by field
    pub(crate) errors: Vec<String>,
    /// Storage classes the namespace offers, when probed
    pub(crate) storage_classes: Vec<String>,
}

/// Run the name step rules over `name` and `namespace`
///
/// Without a probe outcome only the field rules run; with one, the
/// namespace must also be free and offer a storage class.
pub(crate) fn validate_tenant(
    name: &str,
    namespace: &str,
    probed: Option<NamespaceStatus>,
    translator: &dyn Translator,
) -> TenantCheck {
    let mut wizard = TenantWizard::new();
    wizard.update_field(steps::NAME_TENANT, "tenantName", name);
    wizard.update_field(steps::NAME_TENANT, "namespace", namespace);

    let valid = match probed {
        Some(status) => {
            wizard.apply_namespace_status(status);
            wizard.revalidate_name()
        }
        None => wizard.name_errors().is_valid(),
    };

    TenantCheck {
        valid,
        errors: wizard
            .name_errors()
            .localize(translator)
            .into_iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect(),
        storage_classes: wizard.namespace_status().storage_classes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{Method, RequestError};
    use portal_test_utils::{english_catalog, RecordingSink, StaticApi};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn buckets_api() -> Arc<StaticApi> {
        Arc::new(StaticApi::new().with(
            Method::Get,
            "/api/v1/buckets",
            json!({"buckets": [
                {"name": "logs", "size": 2048},
                {"name": "Archive"},
                {"name": "app-logs", "size": 0},
            ]}),
        ))
    }

    #[tokio::test]
    async fn lists_filtered_and_sorted() {
        let api = buckets_api();
        let sink = Arc::new(RecordingSink::new());
        let lines = list_kind("buckets", api, sink, "LOG", "asc", false)
            .await
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "NAME\tSIZE\tCREATED".to_string(),
                "app-logs\t0 B\t".to_string(),
                "logs\t2.0 KiB\t".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn json_output_keeps_source_order() {
        let lines = list_kind(
            "buckets",
            buckets_api(),
            Arc::new(RecordingSink::new()),
            "",
            "source",
            true,
        )
        .await
        .unwrap();
        let names: Vec<String> = serde_json::from_str::<Vec<Bucket>>(&lines[0])
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["logs", "Archive", "app-logs"]);
    }

    #[tokio::test]
    async fn failed_load_is_reported_and_returned() {
        let api = Arc::new(StaticApi::new().with_error(
            Method::Get,
            "/api/v1/users",
            RequestError::new("Access Denied").with_status(403),
        ));
        let sink = Arc::new(RecordingSink::new());
        let err = list_kind("users", api, sink.clone(), "", "source", false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Access Denied");
        assert_eq!(sink.messages(), vec!["Access Denied".to_string()]);
    }

    #[tokio::test]
    async fn service_accounts_listed() {
        let api = Arc::new(StaticApi::new().with(
            Method::Get,
            "/api/v1/service-accounts",
            json!(["svc-b", "svc-a"]),
        ));
        let lines = list_kind(
            "service-accounts",
            api,
            Arc::new(RecordingSink::new()),
            "",
            "source",
            false,
        )
        .await
        .unwrap();
        assert_eq!(lines, vec!["SERVICE ACCOUNT", "svc-a", "svc-b"]);
    }

    #[tokio::test]
    async fn unknown_kind_rejected() {
        let result = list_kind(
            "tenants",
            buckets_api(),
            Arc::new(RecordingSink::new()),
            "",
            "source",
            false,
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn tenant_name_pattern_error() {
        let check = validate_tenant("My_Tenant", "tenants", None, &english_catalog());
        assert!(!check.valid);
        assert_eq!(check.errors.len(), 1);
        assert!(check.errors[0].starts_with("tenant-name: "));
    }

    #[test]
    fn tenant_offline_valid() {
        let check = validate_tenant("my-tenant", "tenants", None, &english_catalog());
        assert_eq!(
            check,
            TenantCheck {
                valid: true,
                errors: vec![],
                storage_classes: vec![],
            }
        );
    }

    #[test]
    fn probed_namespace_decides() {
        let catalog = english_catalog();
        let occupied =
            validate_tenant("my-tenant", "tenants", Some(NamespaceStatus::Occupied), &catalog);
        assert!(!occupied.valid);
        assert!(occupied.errors[0].starts_with("namespace: "));

        let free = validate_tenant(
            "my-tenant",
            "tenants",
            Some(NamespaceStatus::Available(vec!["standard".into()])),
            &catalog,
        );
        assert!(free.valid);
        assert_eq!(free.storage_classes, vec!["standard".to_string()]);
    }
}
