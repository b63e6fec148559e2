//! One entry point wiring every manager to a shared client
//!
//! Leaf managers are built first and handed to the managers that need them,
//! so no manager holds a back-reference to another.

use std::time::Duration;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::lookup::{Scope, non_empty, select};
use crate::models::{
    Account, AccountManager, App, AppManager, Database, DatabaseManager, OperationManager,
    Service, ServiceManager, Stack, StackManager, VhostManager,
};
use crate::progress::PollOptions;
use crate::resource::Resource;

/// All resource managers over one [`ApiClient`]
#[derive(Clone)]
pub struct Platform {
    client: ApiClient,
    pub stacks: StackManager,
    pub accounts: AccountManager,
    pub operations: OperationManager,
    pub services: ServiceManager,
    pub apps: AppManager,
    pub databases: DatabaseManager,
    pub vhosts: VhostManager,
}

impl Platform {
    /// Wire every manager; `poll` governs how mutating calls wait
    pub fn new(client: ApiClient, poll: PollOptions) -> Self {
        let stacks = StackManager::new(client.clone());
        let accounts = AccountManager::new(client.clone(), stacks.clone());
        let operations = OperationManager::new(client.clone(), poll);
        let services = ServiceManager::new(client.clone(), operations.clone());
        let apps = AppManager::new(client.clone(), operations.clone(), services.clone());
        let databases = DatabaseManager::new(client.clone(), operations.clone());
        let vhosts = VhostManager::new(client.clone(), operations.clone());

        Self {
            client,
            stacks,
            accounts,
            operations,
            services,
            apps,
            databases,
            vhosts,
        }
    }

    /// Shared client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Same platform with a different deadline for operation polling
    #[must_use]
    pub fn with_poll_timeout(&self, timeout: Duration) -> Self {
        Self::new(
            self.client.clone(),
            self.operations.poll_options().with_timeout(timeout),
        )
    }

    /// Account named `handle`
    pub async fn account(&self, handle: &str) -> Result<Account> {
        self.accounts
            .get(handle)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Account {} not found.", handle)))
    }

    /// Stack named `name`
    pub async fn stack(&self, name: &str) -> Result<Stack> {
        self.stacks
            .get(name)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Stack {} not found.", name)))
    }

    /// Accounts on the stack named `stack_name`
    pub async fn accounts_on_stack(&self, stack_name: &str) -> Result<Vec<Account>> {
        let stack = self.stack(stack_name).await?;
        self.accounts.get_by_stack_id(stack.id).await
    }

    /// App named `handle`, narrowed to `account` when given
    pub async fn find_app(&self, handle: &str, account: Option<&str>) -> Result<App> {
        let apps = self.apps.list().await?;
        let scope = self.account_scope_for(handle, &apps, account).await?;
        select("app", handle, apps, scope.as_ref(), |app: &App| {
            app.account_id().ok()
        })
    }

    /// Database named `handle`, narrowed to `account` when given
    pub async fn find_database(&self, handle: &str, account: Option<&str>) -> Result<Database> {
        let databases = self.databases.list().await?;
        let scope = self.account_scope_for(handle, &databases, account).await?;
        select("database", handle, databases, scope.as_ref(), Database::account_id)
    }

    /// Service named `service` inside app `app`
    pub async fn find_service(
        &self,
        app: &str,
        service: &str,
        account: Option<&str>,
    ) -> Result<(App, Service)> {
        let app = self.find_app(app, account).await?;
        let found = self
            .services
            .get_by_handle_and_app(service, app.id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "No service with handle {} found in app {}.",
                    service, app.handle
                ))
            })?;
        Ok((app, found))
    }

    /// Resolve an optional account handle into a lookup scope
    ///
    /// Skipped when nothing is named `handle`, so that the missing resource
    /// is reported before a missing account.
    async fn account_scope_for<T: Resource>(
        &self,
        handle: &str,
        candidates: &[T],
        account: Option<&str>,
    ) -> Result<Option<Scope>> {
        let Some(account) = non_empty(account) else {
            return Ok(None);
        };
        if !candidates.iter().any(|c| c.name() == Some(handle)) {
            return Ok(None);
        }
        let account = self.account(account).await?;
        Ok(Some(Scope {
            kind: "account",
            handle: account.handle,
            id: account.id,
        }))
    }
}
