//! Console collections and their mutations
//!
//! Buckets, users, policies, service accounts and direct-attached drives,
//! each with its list endpoint and the actions the console offers on its
//! rows.

use crate::action::{ActionTarget, RowAction, TargetKind};
use crate::entity::{Entity, EntitySource, Resource};
use async_trait::async_trait;
use portal_core::format::{encode_uri, encode_uri_component};
use portal_core::{ApiClient, Method, RequestError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Storage bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bucket {
    /// Bucket name
    pub name: String,
    /// Used bytes
    pub size: Option<u64>,
    /// Creation timestamp as sent by the backend
    pub creation_date: Option<String>,
}

impl Entity for Bucket {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn display(&self) -> &str {
        &self.name
    }
}

impl Resource for Bucket {
    const PATH: &'static str = "/api/v1/buckets";
    const COLLECTION: &'static str = "buckets";
}

/// Console user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    /// Access key, also the user name
    pub access_key: String,
    /// Attached policies
    pub policy: Vec<String>,
    /// Group memberships
    pub member_of: Vec<String>,
    /// `enabled` or `disabled`
    pub status: String,
}

impl Entity for User {
    fn id(&self) -> String {
        self.access_key.clone()
    }

    fn display(&self) -> &str {
        &self.access_key
    }
}

impl Resource for User {
    const PATH: &'static str = "/api/v1/users";
    const COLLECTION: &'static str = "users";
}

/// Access policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Policy name
    pub name: String,
    /// Policy document, JSON text
    pub policy: String,
}

impl Entity for Policy {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn display(&self) -> &str {
        &self.name
    }
}

impl Resource for Policy {
    const PATH: &'static str = "/api/v1/policies";
    const COLLECTION: &'static str = "policies";
}

/// Drive managed by the direct CSI driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drive {
    /// Device path on the node
    pub drive: String,
    /// Node hosting the drive
    pub node: String,
    /// Total bytes
    pub capacity: u64,
    /// Allocated bytes
    pub allocated: u64,
    /// Drive status as reported by the driver
    pub status: String,
    /// Volumes placed on the drive
    pub volumes: u64,
}

impl Entity for Drive {
    /// `node:drive`, unique across the cluster
    fn id(&self) -> String {
        format!("{}:{}", self.node, self.drive)
    }

    fn display(&self) -> &str {
        &self.drive
    }
}

impl Resource for Drive {
    const PATH: &'static str = "/api/v1/direct-csi/drives";
    const COLLECTION: &'static str = "drives";
}

/// Service account of the signed-in user, listed by access key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceAccount {
    /// Access key
    pub name: String,
}

impl Entity for ServiceAccount {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn display(&self) -> &str {
        &self.name
    }
}

/// Service accounts endpoint; answers with a bare, unsorted array of keys
#[derive(Clone)]
pub struct ServiceAccountSource {
    api: Arc<dyn ApiClient>,
}

impl std::fmt::Debug for ServiceAccountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountSource").finish_non_exhaustive()
    }
}

impl ServiceAccountSource {
    /// List endpoint
    pub const PATH: &'static str = "/api/v1/service-accounts";

    /// Source reading through `api`
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EntitySource<ServiceAccount> for ServiceAccountSource {
    /// Keys sorted by name
    async fn fetch(&self) -> Result<Vec<ServiceAccount>, RequestError> {
        let body = self.api.invoke(Method::Get, Self::PATH, None).await?;
        let mut accounts: Vec<ServiceAccount> = match body {
            Value::Null => Vec::new(),
            list => serde_json::from_value(list).map_err(|e| {
                RequestError::new("malformed service-accounts response")
                    .with_detail(e.to_string())
            })?,
        };
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }
}

/// Delete a service account by access key
pub fn delete_service_account(api: Arc<dyn ApiClient>) -> RowAction<ServiceAccount> {
    RowAction::on_id("delete", move |name| {
        let api = Arc::clone(&api);
        async move {
            api.invoke(
                Method::Delete,
                &format!("/api/v1/service-accounts/{}", encode_uri_component(&name)),
                None,
            )
            .await
            .map(drop)
        }
    })
}

/// Delete a bucket by name
pub fn delete_bucket(api: Arc<dyn ApiClient>) -> RowAction<Bucket> {
    RowAction::on_id("delete", move |name| {
        let api = Arc::clone(&api);
        async move {
            api.invoke(
                Method::Delete,
                &format!("/api/v1/buckets/{name}"),
                Some(json!({ "name": name })),
            )
            .await
            .map(drop)
        }
    })
}

/// Delete a user by access key
pub fn delete_user(api: Arc<dyn ApiClient>) -> RowAction<User> {
    RowAction::on_entity("delete", move |user: User| {
        let api = Arc::clone(&api);
        async move {
            api.invoke(
                Method::Delete,
                &format!("/api/v1/user?name={}", encode_uri(&user.access_key)),
                Some(json!({ "id": user.access_key })),
            )
            .await
            .map(drop)
        }
    })
}

/// Format the selected drives
///
/// The backend answers with a per-drive issue list; any issue fails the
/// action with the issues as detail.
pub fn format_drives(api: Arc<dyn ApiClient>, force: bool) -> RowAction<Drive> {
    let handler = Arc::new(move |target: ActionTarget<Drive>| {
        let api = Arc::clone(&api);
        let drives = match target {
            ActionTarget::Ids(ids) => ids,
            ActionTarget::Id(id) => vec![id],
            ActionTarget::Entity(drive) => vec![drive.id()],
        };
        let fut: futures::future::BoxFuture<'static, Result<(), RequestError>> =
            Box::pin(async move {
                let body = json!({ "drives": drives, "force": force });
                let res = api
                    .invoke(Method::Post, "/api/v1/direct-csi/drives/format", Some(body))
                    .await?;
                format_issues(&res)
            });
        fut
    });
    RowAction::with_handler("format", TargetKind::Id, handler)
}

fn format_issues(res: &Value) -> Result<(), RequestError> {
    let issues: Vec<String> = res
        .get("formatIssuesList")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|issue| {
                    let node = issue.get("node").and_then(Value::as_str).unwrap_or("");
                    let drive = issue.get("drive").and_then(Value::as_str).unwrap_or("");
                    let error = issue.get("error").and_then(Value::as_str).unwrap_or("");
                    format!("{node}:{drive}: {error}")
                })
                .collect()
        })
        .unwrap_or_default();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RequestError::new(format!("{} drive(s) could not be formatted", issues.len()))
            .with_detail(issues.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::decode_collection;
    use portal_test_utils::StaticApi;

    #[test]
    fn user_fields_are_camel_case() {
        let users: Vec<User> = decode_collection(
            json!({"users": [{"accessKey": "ana", "memberOf": ["ops"], "status": "enabled"}]}),
            User::COLLECTION,
        )
        .unwrap();
        assert_eq!(users[0].id(), "ana");
        assert_eq!(users[0].member_of, vec!["ops"]);
        assert!(users[0].policy.is_empty());
    }

    #[test]
    fn drive_id_joins_node() {
        let drive = Drive {
            drive: "/dev/sdb".into(),
            node: "n1".into(),
            ..Drive::default()
        };
        assert_eq!(drive.id(), "n1:/dev/sdb");
        assert_eq!(drive.display(), "/dev/sdb");
    }

    #[tokio::test]
    async fn delete_user_encodes_name() {
        let api = Arc::new(StaticApi::new().with(
            Method::Delete,
            "/api/v1/user?name=j%20doe",
            json!(null),
        ));
        let action = delete_user(api.clone());
        let user = User {
            access_key: "j doe".into(),
            ..User::default()
        };
        action.run(ActionTarget::Entity(user)).await.unwrap();
        assert_eq!(api.calls()[0].body, Some(json!({"id": "j doe"})));
    }

    #[tokio::test]
    async fn service_accounts_sorted() {
        let api = Arc::new(StaticApi::new().with(
            Method::Get,
            ServiceAccountSource::PATH,
            json!(["zeta", "alpha", "Mid"]),
        ));
        let accounts = ServiceAccountSource::new(api).fetch().await.unwrap();
        let names: Vec<&str> = accounts.iter().map(ServiceAccount::display).collect();
        assert_eq!(names, vec!["Mid", "alpha", "zeta"]);
    }

    #[tokio::test]
    async fn service_accounts_null_is_empty() {
        let api = Arc::new(StaticApi::new().with(Method::Get, ServiceAccountSource::PATH, json!(null)));
        assert!(ServiceAccountSource::new(api).fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_service_account_encodes_key() {
        let api = Arc::new(StaticApi::new().with(
            Method::Delete,
            "/api/v1/service-accounts/svc%2F1",
            json!(null),
        ));
        delete_service_account(api.clone())
            .run(ActionTarget::Id("svc/1".into()))
            .await
            .unwrap();
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn format_issues_fail_the_action() {
        let api = Arc::new(StaticApi::new().with(
            Method::Post,
            "/api/v1/direct-csi/drives/format",
            json!({"formatIssuesList": [{"node": "n1", "drive": "/dev/sdb", "error": "busy"}]}),
        ));
        let action = format_drives(api.clone(), true);
        let err = action
            .run(ActionTarget::Ids(vec!["n1:/dev/sdb".into()]))
            .await
            .unwrap_err();
        assert_eq!(err.detail.as_deref(), Some("n1:/dev/sdb: busy"));
        assert_eq!(
            api.calls()[0].body,
            Some(json!({"drives": ["n1:/dev/sdb"], "force": true}))
        );
    }
}
