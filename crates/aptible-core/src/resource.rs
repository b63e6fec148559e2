//! Resource snapshots and the generic create/list/get/delete manager
//!
//! Collection endpoints answer with a HAL envelope:
//!
//! ```json
//! { "_embedded": { "apps": [ { "id": 1, "handle": "web", "_links": { ... } } ] } }
//! ```
//!
//! Single-resource endpoints return the item itself. Every item may carry
//! `_links`, a map of relation name to `{ "href": ... }`, whose trailing
//! path segment is the related resource's numeric id.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{CoreError, Result};

/// Page size large enough to fetch every item in one request
const PAGE_SIZE: u32 = 5000;

/// A single hypermedia link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Anything else the server attached (`templated`, `title`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Relation name to link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Option<Link>>);

impl Links {
    /// Look up a relation; `null` links count as absent
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.get(rel).and_then(Option::as_ref)
    }

    /// Insert or replace a relation
    pub fn insert(&mut self, rel: impl Into<String>, href: impl Into<String>) {
        self.0.insert(
            rel.into(),
            Some(Link {
                href: Some(href.into()),
                extra: Map::new(),
            }),
        );
    }

    /// Id of a relation that must be present; `label` names it in errors
    pub(crate) fn required_id(&self, rel: &str, label: &str) -> Result<i64> {
        let link = self
            .get(rel)
            .ok_or_else(|| CoreError::Decode(format!("{} is missing from links", label)))?;
        let href = link
            .href
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CoreError::Decode(format!("{} link is missing href", label)))?;
        trailing_id(href)
            .ok_or_else(|| CoreError::Decode(format!("{} link has no numeric id: {}", label, href)))
    }

    /// Id of a relation that may be absent
    pub(crate) fn optional_id(&self, rel: &str) -> Option<i64> {
        self.get(rel)
            .and_then(|link| link.href.as_deref())
            .and_then(trailing_id)
    }
}

/// Parse the last path segment of an href as an id
fn trailing_id(href: &str) -> Option<i64> {
    href.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// A typed snapshot of one platform resource
///
/// Implementors declare where their collection lives and which field holds
/// the human-readable name. Hydration goes through [`Resource::hydrate`] so
/// that mandatory relations are checked up front.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path, e.g. `/apps`
    const PATH: &'static str;

    /// Key under `_embedded` holding the collection, e.g. `apps`
    const COLLECTION: &'static str;

    /// Numeric id
    fn id(&self) -> i64;

    /// Name matched by handle lookups (`handle` for most resources)
    fn name(&self) -> Option<&str> {
        None
    }

    /// Reject payloads lacking a mandatory relation
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Derived relation ids, included in [`Resource::snapshot`]
    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        Vec::new()
    }

    /// Build a snapshot from a server payload
    fn hydrate(value: Value) -> Result<Self> {
        let resource: Self = serde_json::from_value(value).map_err(CoreError::decode)?;
        resource.validate()?;
        Ok(resource)
    }

    /// Render as a plain JSON object, derived relation ids included
    fn snapshot(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self).map_err(CoreError::decode)?;
        if let Value::Object(map) = &mut value {
            for (key, id) in self.relations() {
                map.insert(key.to_string(), id.map_or(Value::Null, Value::from));
            }
        }
        Ok(value)
    }
}

/// Hydrate every item in a HAL collection envelope
///
/// A body without the `_embedded` wrapper (or without the collection key)
/// is an empty collection rather than an error.
pub fn embedded<T: Resource>(body: Value) -> Result<Vec<T>> {
    let items = match body {
        Value::Object(mut map) => match map.remove("_embedded") {
            Some(Value::Object(mut embedded)) => embedded.remove(T::COLLECTION),
            _ => None,
        },
        _ => None,
    };

    match items {
        Some(Value::Array(items)) => items.into_iter().map(T::hydrate).collect(),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(CoreError::Decode(format!(
            "expected an array under _embedded.{}, got {}",
            T::COLLECTION,
            other
        ))),
    }
}

/// Append the page-size and embed-suppression parameters
pub(crate) fn collection_query(path: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{}{}per_page={}&no_embed=true",
        path, separator, PAGE_SIZE
    )
}

/// Shared list/get/create/delete access for one resource type
pub struct ResourceManager<T> {
    client: ApiClient,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceManager<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> ResourceManager<T> {
    /// Create a manager over `client`
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    /// Underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// List every resource of this type
    pub async fn list(&self) -> Result<Vec<T>> {
        self.list_at(T::PATH).await
    }

    /// List a collection at an arbitrary path (e.g. `/apps/1/services`)
    pub async fn list_at(&self, path: &str) -> Result<Vec<T>> {
        let body = self.client.get(&collection_query(path)).await?;
        let items = embedded::<T>(body)?;
        debug!(collection = T::COLLECTION, count = items.len(), "Listed resources");
        Ok(items)
    }

    /// First resource whose name equals `name`
    ///
    /// Scans the full list; handles are only unique within a parent scope,
    /// so callers needing uniqueness use [`crate::lookup`] instead.
    pub async fn get(&self, name: &str) -> Result<Option<T>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|item| item.name() == Some(name)))
    }

    /// Fetch one resource directly; a 404 is `None`
    pub async fn get_by_id(&self, id: i64) -> Result<Option<T>> {
        match self.client.get(&format!("{}/{}", T::PATH, id)).await {
            Ok(body) => T::hydrate(body).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch one resource directly, failing with a named not-found error
    pub async fn require_by_id(&self, id: i64, label: &str) -> Result<T> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("No {} found with id {}", label, id)))
    }

    /// POST to the collection path and hydrate the result
    pub async fn create<B: Serialize + ?Sized>(&self, data: &B) -> Result<T> {
        self.create_at(T::PATH, data).await
    }

    /// POST to a nested collection (e.g. `/accounts/1/apps`) and hydrate the result
    pub async fn create_at<B: Serialize + ?Sized>(&self, path: &str, data: &B) -> Result<T> {
        let body = self.client.post(path, data).await?;
        let created = T::hydrate(body)?;
        info!(collection = T::COLLECTION, id = created.id(), "Created resource");
        Ok(created)
    }

    /// Raw DELETE of `{collection}/{id}`
    ///
    /// Resources with an operations sub-resource deprovision instead; this is
    /// the fallback for those without one.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("{}/{}", T::PATH, id)).await?;
        info!(collection = T::COLLECTION, id, "Deleted resource");
        Ok(())
    }
}
