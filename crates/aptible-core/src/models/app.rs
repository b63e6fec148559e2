//! Apps and their configure/deploy/deprovision operations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::resource::{Links, Resource, ResourceManager};

use super::operation::{OperationManager, OperationRequest};
use super::service::{Service, ServiceManager};

/// Env var carrying the image for direct Docker deploys
pub const DOCKER_IMAGE_ENV: &str = "APTIBLE_DOCKER_IMAGE";

/// An app: a group of services built from one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub handle: String,
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

impl App {
    /// Owning account; every app has one
    pub fn account_id(&self) -> Result<i64> {
        self.links.required_id("account", "Account")
    }
}

impl Resource for App {
    const PATH: &'static str = "/apps";
    const COLLECTION: &'static str = "apps";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.handle)
    }

    fn validate(&self) -> Result<()> {
        self.account_id().map(|_| ())
    }

    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("account_id", self.account_id().ok())]
    }
}

/// App access plus lifecycle operations
#[derive(Clone)]
pub struct AppManager {
    base: ResourceManager<App>,
    operations: OperationManager,
    services: ServiceManager,
}

delegate_reads!(AppManager, App);

impl AppManager {
    pub fn new(client: ApiClient, operations: OperationManager, services: ServiceManager) -> Self {
        Self {
            base: ResourceManager::new(client),
            operations,
            services,
        }
    }

    /// Create an app in `account_id`
    ///
    /// With an image, the app is configured for a direct Docker deploy and
    /// then deployed; both operations are awaited in order. A failed deploy
    /// leaves the created, configured app in place.
    pub async fn create(
        &self,
        handle: &str,
        account_id: i64,
        docker_image: Option<&str>,
    ) -> Result<App> {
        if handle.is_empty() {
            return Err(CoreError::Validation("A handle is required.".to_string()));
        }

        let app = self
            .base
            .create_at(
                &format!("/accounts/{}/apps", account_id),
                &json!({ "handle": handle }),
            )
            .await?;

        if let Some(image) = docker_image.filter(|i| !i.is_empty()) {
            let env = BTreeMap::from([
                ("FORCE_SSL".to_string(), "1".to_string()),
                (DOCKER_IMAGE_ENV.to_string(), image.to_string()),
            ]);
            self.configure(app.id, env).await?;
            self.deploy(app.id).await?;
        }

        Ok(app)
    }

    /// Set environment variables on an app and wait for the configure operation
    pub async fn configure(&self, app_id: i64, env: BTreeMap<String, String>) -> Result<()> {
        self.operations
            .run("apps", app_id, &OperationRequest::configure(env))
            .await?;
        info!(app_id, "Configured app");
        Ok(())
    }

    /// Deploy the currently configured image and wait for it
    pub async fn deploy(&self, app_id: i64) -> Result<()> {
        self.operations
            .run("apps", app_id, &OperationRequest::new("deploy"))
            .await?;
        info!(app_id, "Deployed app");
        Ok(())
    }

    /// Deprovision an app and wait until it is gone
    pub async fn delete(&self, app_id: i64) -> Result<()> {
        let app = self.base.require_by_id(app_id, "app").await?;
        self.operations
            .run("apps", app.id, &OperationRequest::new("deprovision"))
            .await?;
        info!(handle = %app.handle, "Deprovisioned app");
        Ok(())
    }

    /// Services belonging to an app
    pub async fn services(&self, app_id: i64) -> Result<Vec<Service>> {
        self.services.list_by_app(app_id).await
    }

    /// Operation manager shared with this app manager
    pub fn operations(&self) -> &OperationManager {
        &self.operations
    }
}
