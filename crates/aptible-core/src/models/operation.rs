//! Operations: asynchronous backend jobs and how to start, await, and inspect them

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::progress::{PollOptions, wait_for_operation};
use crate::resource::{Links, Resource, ResourceManager, embedded};

/// Backend operation state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    /// Anything the backend reports that is not listed above
    #[default]
    #[serde(other)]
    Unknown,
}

impl OperationStatus {
    /// `succeeded` or `failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The two fields the poller reads from `/operations/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct StatusProbe {
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// One operation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    /// configure, deploy, scale, provision, deprovision, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Raw status string as reported by the backend
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub resource_id: Option<i64>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Operation {
    /// Parsed status; unrecognized strings are [`OperationStatus::Unknown`]
    pub fn state(&self) -> OperationStatus {
        self.status
            .as_deref()
            .and_then(|s| serde_json::from_value(Value::String(s.to_string())).ok())
            .unwrap_or_default()
    }
}

impl Resource for Operation {
    const PATH: &'static str = "/operations";
    const COLLECTION: &'static str = "operations";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Id, type and status of a recent operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

impl From<Operation> for OperationSummary {
    fn from(op: Operation) -> Self {
        Self {
            id: op.id,
            kind: op.kind.unwrap_or_else(|| "unknown".to_string()),
            status: op.status.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Body POSTed to `/{collection}/{id}/operations`
///
/// Only the fields a caller set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_count: Option<u32>,
    /// Container memory in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_size: Option<u32>,
}

impl OperationRequest {
    /// A request carrying only a type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// A `configure` request setting `env`
    pub fn configure(env: BTreeMap<String, String>) -> Self {
        Self {
            env: Some(env),
            ..Self::new("configure")
        }
    }
}

/// Starts operations, waits on them, and reads their history and logs
#[derive(Clone)]
pub struct OperationManager {
    base: ResourceManager<Operation>,
    poll: PollOptions,
}

impl OperationManager {
    pub fn new(client: ApiClient, poll: PollOptions) -> Self {
        Self {
            base: ResourceManager::new(client),
            poll,
        }
    }

    /// Polling options applied by [`OperationManager::run`]
    pub fn poll_options(&self) -> &PollOptions {
        &self.poll
    }

    /// Same manager with a different polling deadline
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            base: self.base.clone(),
            poll: self.poll.with_timeout(timeout),
        }
    }

    /// Fetch one operation; a 404 is `None`
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Operation>> {
        self.base.get_by_id(id).await
    }

    /// Start an operation against `/{collection}/{resource_id}` without waiting
    pub async fn create(
        &self,
        collection: &str,
        resource_id: i64,
        request: &OperationRequest,
    ) -> Result<Operation> {
        let operation = self
            .base
            .create_at(
                &format!("/{}/{}/operations", collection, resource_id),
                request,
            )
            .await?;
        debug!(
            operation_id = operation.id,
            kind = %request.kind,
            collection,
            resource_id,
            "Started operation"
        );
        Ok(operation)
    }

    /// Block until `operation_id` succeeds, fails, disappears, or times out
    pub async fn wait(&self, operation_id: i64) -> Result<()> {
        wait_for_operation(self.base.client(), operation_id, &self.poll, None).await
    }

    /// Start an operation and wait for it
    pub async fn run(
        &self,
        collection: &str,
        resource_id: i64,
        request: &OperationRequest,
    ) -> Result<Operation> {
        let operation = self.create(collection, resource_id, request).await?;
        self.wait(operation.id).await?;
        info!(
            operation_id = operation.id,
            kind = %request.kind,
            collection,
            resource_id,
            "Operation finished"
        );
        Ok(operation)
    }

    /// Recent operations against `/{collection}/{resource_id}`
    ///
    /// Only the server's default page is requested; long-lived resources
    /// can carry thousands of operations.
    pub async fn list_for(
        &self,
        collection: &str,
        resource_id: i64,
    ) -> Result<Vec<OperationSummary>> {
        let path = format!("/{}/{}/operations", collection, resource_id);
        let body = self.base.client().get(&path).await?;
        Ok(embedded::<Operation>(body)?
            .into_iter()
            .map(OperationSummary::from)
            .collect())
    }

    pub async fn for_app(&self, app_id: i64) -> Result<Vec<OperationSummary>> {
        self.list_for("apps", app_id).await
    }

    pub async fn for_database(&self, database_id: i64) -> Result<Vec<OperationSummary>> {
        self.list_for("databases", database_id).await
    }

    pub async fn for_vhost(&self, vhost_id: i64) -> Result<Vec<OperationSummary>> {
        self.list_for("vhosts", vhost_id).await
    }

    /// Log output of an operation
    ///
    /// The logs endpoint answers with a pre-signed URL; the log text itself
    /// is fetched from there without credentials.
    pub async fn logs(&self, operation_id: i64) -> Result<String> {
        let body = self
            .base
            .client()
            .get_text(&format!("/operations/{}/logs", operation_id))
            .await?;

        let location = body.trim().trim_matches('"');
        if location.is_empty() {
            return Ok(format!(
                "No logs available for operation {} (empty response)",
                operation_id
            ));
        }
        if !location.starts_with("http://") && !location.starts_with("https://") {
            return Err(CoreError::Decode(format!(
                "expected a log URL for operation {}, got {}",
                operation_id, location
            )));
        }

        let logs = self.base.client().fetch_unauthenticated(location).await?;
        if logs.is_empty() {
            return Ok(format!(
                "No logs available for operation {} (empty content from log URL)",
                operation_id
            ));
        }
        Ok(logs)
    }
}
