//! Vhosts (endpoints): public entry points bound to a service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;
use crate::resource::{Links, Resource, ResourceManager};

use super::operation::{OperationManager, OperationRequest};

/// An endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vhost {
    pub id: i64,
    #[serde(default)]
    pub virtual_domain: Option<String>,
    #[serde(default)]
    pub external_host: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vhost {
    /// Service this endpoint routes to; every vhost has one
    pub fn service_id(&self) -> Result<i64> {
        self.links.required_id("service", "Service")
    }
}

impl Resource for Vhost {
    const PATH: &'static str = "/vhosts";
    const COLLECTION: &'static str = "vhosts";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        self.service_id().map(|_| ())
    }

    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("service_id", self.service_id().ok())]
    }
}

/// Fixed body for new endpoints: default-domain HTTPS via ALB
#[derive(Debug, Serialize)]
struct NewVhost {
    service_id: i64,
    #[serde(rename = "type")]
    kind: &'static str,
    platform: &'static str,
    load_balancing_algorithm_type: &'static str,
    default: bool,
    acme: bool,
    internal: bool,
}

impl NewVhost {
    fn http(service_id: i64) -> Self {
        Self {
            service_id,
            kind: "http",
            platform: "alb",
            load_balancing_algorithm_type: "round_robin",
            default: true,
            acme: false,
            internal: false,
        }
    }
}

/// Vhost access plus provisioning
#[derive(Clone)]
pub struct VhostManager {
    base: ResourceManager<Vhost>,
    operations: OperationManager,
}

delegate_reads!(VhostManager, Vhost);

impl VhostManager {
    pub fn new(client: ApiClient, operations: OperationManager) -> Self {
        Self {
            base: ResourceManager::new(client),
            operations,
        }
    }

    /// Create a default HTTP endpoint for a service and wait for it to provision
    pub async fn create(&self, service_id: i64) -> Result<Vhost> {
        let vhost = self
            .base
            .create_at(
                &format!("/services/{}/vhosts", service_id),
                &NewVhost::http(service_id),
            )
            .await?;

        self.operations
            .run("vhosts", vhost.id, &OperationRequest::new("provision"))
            .await?;
        info!(vhost_id = vhost.id, service_id, "Provisioned endpoint");
        Ok(vhost)
    }

    /// Endpoints of one service
    pub async fn list_by_service(&self, service_id: i64) -> Result<Vec<Vhost>> {
        self.base
            .list_at(&format!("/services/{}/vhosts", service_id))
            .await
    }

    /// Deprovision an endpoint and wait until it is gone
    pub async fn delete(&self, vhost_id: i64) -> Result<()> {
        let vhost = self.base.require_by_id(vhost_id, "vhost").await?;
        self.operations
            .run("vhosts", vhost.id, &OperationRequest::new("deprovision"))
            .await?;
        info!(vhost_id, "Deprovisioned endpoint");
        Ok(())
    }
}
