//! Accounts (environments)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::resource::{Links, Resource, ResourceManager};

use super::stack::StackManager;

/// An environment grouping apps and databases on one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub handle: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    /// Stack this account lives on, if the link is present
    pub fn stack_id(&self) -> Option<i64> {
        self.links.optional_id("stack")
    }
}

impl Resource for Account {
    const PATH: &'static str = "/accounts";
    const COLLECTION: &'static str = "accounts";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.handle)
    }

    fn relations(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("stack_id", self.stack_id())]
    }
}

/// Account access plus creation on a stack
#[derive(Clone)]
pub struct AccountManager {
    base: ResourceManager<Account>,
    stacks: StackManager,
}

delegate_reads!(AccountManager, Account);

impl AccountManager {
    /// Create the manager; stacks are needed to decide the account type
    pub fn new(client: ApiClient, stacks: StackManager) -> Self {
        Self {
            base: ResourceManager::new(client),
            stacks,
        }
    }

    /// Accounts whose stack link points at `stack_id`
    pub async fn get_by_stack_id(&self, stack_id: i64) -> Result<Vec<Account>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|account| account.stack_id() == Some(stack_id))
            .collect())
    }

    /// Create an account on `stack_id`
    ///
    /// Dedicated stacks get a `production` account, shared ones a
    /// `development` account. The account joins the caller's first
    /// organization.
    pub async fn create(&self, handle: &str, stack_id: i64) -> Result<Account> {
        if handle.is_empty() {
            return Err(CoreError::Validation("A handle is required.".to_string()));
        }

        let stack = self
            .stacks
            .get_by_id(stack_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Stack {} not found", stack_id)))?;

        let account_type = if stack.is_dedicated() {
            "production"
        } else {
            "development"
        };
        let organization_id = self.base.client().organization_id().await?;

        let account = self
            .base
            .create(&json!({
                "handle": handle,
                "stack_id": stack.id,
                "type": account_type,
                "organization_id": organization_id,
            }))
            .await?;
        info!(handle = %account.handle, account_type, stack = %stack.name, "Created account");
        Ok(account)
    }
}
