//! Listed entities and where they come from

use async_trait::async_trait;
use portal_core::{ApiClient, Method, RequestError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A record shown as one row of a list screen
pub trait Entity: Clone + Send + Sync + 'static {
    /// Row key, also the argument of id-targeted actions
    fn id(&self) -> String;

    /// Field used for filtering and display sorting
    fn display(&self) -> &str;
}

/// A backend collection with a fixed list endpoint
pub trait Resource: Entity + DeserializeOwned {
    /// List endpoint
    const PATH: &'static str;
    /// Key of the array in the list response
    const COLLECTION: &'static str;
}

/// Anything able to fetch the full entity list
#[async_trait]
pub trait EntitySource<E: Entity>: Send + Sync {
    /// Fetch every entity
    async fn fetch(&self) -> Result<Vec<E>, RequestError>;
}

/// Source reading one collection of a JSON list endpoint
///
/// A missing or `null` collection is an empty list.
pub struct ApiSource<E> {
    api: Arc<dyn ApiClient>,
    path: String,
    collection: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for ApiSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSource")
            .field("path", &self.path)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<E> ApiSource<E> {
    /// Source for an arbitrary endpoint
    #[must_use]
    pub fn new(
        api: Arc<dyn ApiClient>,
        path: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            api,
            path: path.into(),
            collection: collection.into(),
            _entity: PhantomData,
        }
    }

    /// Endpoint path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<E: Resource> ApiSource<E> {
    /// Source for a known resource
    #[must_use]
    pub fn for_resource(api: Arc<dyn ApiClient>) -> Self {
        Self::new(api, E::PATH, E::COLLECTION)
    }
}

#[async_trait]
impl<E> EntitySource<E> for ApiSource<E>
where
    E: Entity + DeserializeOwned,
{
    async fn fetch(&self) -> Result<Vec<E>, RequestError> {
        let body = self.api.invoke(Method::Get, &self.path, None).await?;
        decode_collection(body, &self.collection)
    }
}

/// Pull `collection` out of a list response
///
/// # Errors
/// A `RequestError` when the collection is present but not a list of `E`.
pub fn decode_collection<E: DeserializeOwned>(
    mut body: Value,
    collection: &str,
) -> Result<Vec<E>, RequestError> {
    match body.get_mut(collection).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list).map_err(|e| {
            RequestError::new(format!("malformed {collection} response")).with_detail(e.to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        name: String,
    }

    #[test]
    fn null_or_missing_collection_is_empty() {
        let items: Vec<Item> = decode_collection(json!({"items": null}), "items").unwrap();
        assert!(items.is_empty());
        let items: Vec<Item> = decode_collection(json!({}), "items").unwrap();
        assert!(items.is_empty());
        let items: Vec<Item> = decode_collection(Value::Null, "items").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn decodes_collection() {
        let items: Vec<Item> =
            decode_collection(json!({"items": [{"name": "a"}, {"name": "b"}]}), "items").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "b");
    }

    #[test]
    fn malformed_collection_is_request_error() {
        let err = decode_collection::<Item>(json!({"items": 3}), "items").unwrap_err();
        assert_eq!(err.message, "malformed items response");
        assert!(err.detail.is_some());
    }
}
