//! Services: independently scaled process groups within an app

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::resource::{Links, Resource, ResourceManager};

use super::operation::{OperationManager, OperationRequest};

/// A service of an app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub handle: String,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub container_count: Option<u32>,
    #[serde(default)]
    pub container_memory_limit_mb: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    /// Owning app; every service has one
    pub fn app_id(&self) -> Result<i64> {
        self.links.required_id("app", "App")
    }
}

impl Resource for Service {
    const PATH: &'static str = "/services";
    const COLLECTION: &'static str = "services";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.handle)
    }

    fn validate(&self) -> Result<()> {
        self.app_id().map(|_| ())
    }

    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("app_id", self.app_id().ok())]
    }
}

/// Target shape for a scale operation
///
/// At least one field must be set; unset fields are left unchanged by the
/// backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleRequest {
    pub container_count: Option<u32>,
    pub container_memory_mb: Option<u32>,
}

impl ScaleRequest {
    pub fn is_empty(&self) -> bool {
        self.container_count.is_none() && self.container_memory_mb.is_none()
    }

    fn into_operation(self) -> OperationRequest {
        OperationRequest {
            container_count: self.container_count,
            container_size: self.container_memory_mb,
            ..OperationRequest::new("scale")
        }
    }
}

/// Service access plus scaling
#[derive(Clone)]
pub struct ServiceManager {
    base: ResourceManager<Service>,
    operations: OperationManager,
}

delegate_reads!(ServiceManager, Service);

impl ServiceManager {
    pub fn new(client: ApiClient, operations: OperationManager) -> Self {
        Self {
            base: ResourceManager::new(client),
            operations,
        }
    }

    /// Services of one app
    pub async fn list_by_app(&self, app_id: i64) -> Result<Vec<Service>> {
        self.base.list_at(&format!("/apps/{}/services", app_id)).await
    }

    /// Service named `handle` within one app
    pub async fn get_by_handle_and_app(&self, handle: &str, app_id: i64) -> Result<Option<Service>> {
        Ok(self
            .list_by_app(app_id)
            .await?
            .into_iter()
            .find(|service| service.handle == handle))
    }

    /// Scale a service, wait for the operation, and return the fresh snapshot
    pub async fn scale(&self, service_id: i64, request: ScaleRequest) -> Result<Service> {
        if request.is_empty() {
            return Err(CoreError::Validation(
                "Must specify at least one of container_count or container_memory_limit_mb".to_string(),
            ));
        }

        self.operations
            .run("services", service_id, &request.into_operation())
            .await?;

        let service = self.base.require_by_id(service_id, "service").await?;
        info!(
            handle = %service.handle,
            container_count = ?service.container_count,
            memory_mb = ?service.container_memory_limit_mb,
            "Scaled service"
        );
        Ok(service)
    }

    /// Deprovision a service and wait until it is gone
    pub async fn delete(&self, service_id: i64) -> Result<()> {
        let service = self.base.require_by_id(service_id, "service").await?;
        self.operations
            .run("services", service.id, &OperationRequest::new("deprovision"))
            .await?;
        Ok(())
    }
}
