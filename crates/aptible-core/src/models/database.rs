//! Managed databases and the images they are built from

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::resource::{Links, Resource, ResourceManager};

use super::operation::{OperationManager, OperationRequest};

/// An available database type and version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseImage {
    pub id: i64,
    /// postgresql, redis, mysql, ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for DatabaseImage {
    const PATH: &'static str = "/database_images";
    const COLLECTION: &'static str = "database_images";

    fn id(&self) -> i64 {
        self.id
    }
}

/// A managed database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub handle: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
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

impl Database {
    /// Owning account, if linked
    pub fn account_id(&self) -> Option<i64> {
        self.links.optional_id("account")
    }

    /// Image the database runs, if linked
    pub fn database_image_id(&self) -> Option<i64> {
        self.links.optional_id("database_image")
    }
}

impl Resource for Database {
    const PATH: &'static str = "/databases";
    const COLLECTION: &'static str = "databases";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.handle)
    }

    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![
            ("account_id", self.account_id()),
            ("database_image_id", self.database_image_id()),
        ]
    }
}

/// Database access plus provisioning
#[derive(Clone)]
pub struct DatabaseManager {
    base: ResourceManager<Database>,
    images: ResourceManager<DatabaseImage>,
    operations: OperationManager,
}

delegate_reads!(DatabaseManager, Database);

impl DatabaseManager {
    pub fn new(client: ApiClient, operations: OperationManager) -> Self {
        Self {
            base: ResourceManager::new(client.clone()),
            images: ResourceManager::new(client),
            operations,
        }
    }

    /// Every database image the platform offers
    pub async fn list_available_types(&self) -> Result<Vec<DatabaseImage>> {
        self.images.list().await
    }

    /// Create a database in `account_id` from image `image_id` and wait for it to provision
    ///
    /// The image must match exactly one available image.
    pub async fn create(&self, handle: &str, account_id: i64, image_id: i64) -> Result<Database> {
        if handle.is_empty() {
            return Err(CoreError::Validation("A handle is required.".to_string()));
        }

        let mut matches: Vec<DatabaseImage> = self
            .list_available_types()
            .await?
            .into_iter()
            .filter(|image| image.id == image_id)
            .collect();
        let image = match matches.len() {
            0 => {
                return Err(CoreError::NotFound(format!(
                    "No database image found with id {}",
                    image_id
                )));
            }
            1 => matches.remove(0),
            _ => {
                return Err(CoreError::Ambiguous(format!(
                    "Multiple database images found with id {}",
                    image_id
                )));
            }
        };

        let database = self
            .base
            .create_at(
                &format!("/accounts/{}/databases", account_id),
                &json!({
                    "handle": handle,
                    "database_image_id": image.id,
                    "type": image.kind,
                }),
            )
            .await?;

        self.operations
            .run("databases", database.id, &OperationRequest::new("provision"))
            .await?;
        info!(handle = %database.handle, kind = %image.kind, "Provisioned database");
        Ok(database)
    }

    /// Deprovision a database and wait until it is gone
    pub async fn delete(&self, database_id: i64) -> Result<()> {
        let database = self.base.require_by_id(database_id, "database").await?;
        self.operations
            .run("databases", database.id, &OperationRequest::new("deprovision"))
            .await?;
        info!(handle = %database.handle, "Deprovisioned database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relations_are_optional() {
        let db = Database::hydrate(json!({"id": 1, "handle": "pg", "type": "postgresql"})).unwrap();
        assert_eq!(db.account_id(), None);
        assert_eq!(db.database_image_id(), None);

        let snapshot = db.snapshot().unwrap();
        assert!(snapshot["account_id"].is_null());
        assert_eq!(snapshot["type"], "postgresql");
    }

    #[test]
    fn test_relations_from_links() {
        let db = Database::hydrate(json!({
            "id": 1,
            "handle": "pg",
            "_links": {
                "account": {"href": "https://api.aptible.com/accounts/8"},
                "database_image": {"href": "https://api.aptible.com/database_images/31"}
            }
        }))
        .unwrap();
        assert_eq!(db.account_id(), Some(8));
        assert_eq!(db.database_image_id(), Some(31));
    }
}
