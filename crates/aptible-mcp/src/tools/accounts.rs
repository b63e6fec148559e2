//! Environment (account) tools

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{
    api_error, platform_error, require_handle, require_write, snapshot, snapshot_list,
};

/// Input for listing accounts (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListAccountsInput {}

/// Build the list_accounts tool
pub fn list_accounts(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_accounts")
        .description("List all Aptible environments (accounts) visible to the current user")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListAccountsInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<ListAccountsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let accounts = platform
                    .accounts
                    .list()
                    .await
                    .map_err(|e| api_error("Failed to list accounts", e))?;

                snapshot_list("accounts", &accounts)
            },
        )
        .build()
}

/// Input for getting one account
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAccountInput {
    /// Handle of the environment
    pub account_handle: String,
}

/// Build the get_account tool
pub fn get_account(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_account")
        .description("Get an Aptible environment (account) by handle, including its stack id")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetAccountInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetAccountInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let account = platform
                    .accounts
                    .get(&input.account_handle)
                    .await
                    .map_err(|e| api_error("Failed to get account", e))?;

                match account {
                    Some(account) => snapshot(&account),
                    None => Ok(CallToolResult::text(format!(
                        "No account found with handle {}.",
                        input.account_handle
                    ))),
                }
            },
        )
        .build()
}

/// Input for listing the accounts on a stack
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAccountsByStackInput {
    /// Name of the stack
    pub stack_name: String,
}

/// Build the get_accounts_by_stack tool
pub fn get_accounts_by_stack(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_accounts_by_stack")
        .description("List the Aptible environments (accounts) that run on the named stack")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetAccountsByStackInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<GetAccountsByStackInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let accounts = platform
                    .accounts_on_stack(&input.stack_name)
                    .await
                    .map_err(|e| api_error("Failed to list accounts on stack", e))?;

                snapshot_list("accounts", &accounts)
            },
        )
        .build()
}

/// Input for creating an account
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAccountInput {
    /// Handle for the new environment
    pub account_name: String,
    /// Name of the stack to place it on
    pub stack_name: String,
}

/// Build the create_account tool
pub fn create_account(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("create_account")
        .description(
            "Create an Aptible environment (account) on the named stack. Environments on \
             dedicated stacks are created as production, others as development.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, CreateAccountInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<CreateAccountInput>| async move {
                require_write(&state)?;
                require_handle(&input.account_name)?;

                let platform = state.platform().await.map_err(platform_error)?;
                let stack = platform
                    .stack(&input.stack_name)
                    .await
                    .map_err(|e| api_error("Failed to create account", e))?;
                let account = platform
                    .accounts
                    .create(&input.account_name, stack.id)
                    .await
                    .map_err(|e| api_error("Failed to create account", e))?;

                snapshot(&account)
            },
        )
        .build()
}

/// Build an MCP sub-router containing the account tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_accounts(state.clone()))
        .tool(get_account(state.clone()))
        .tool(get_accounts_by_stack(state.clone()))
        .tool(create_account(state))
}
