//! App tools

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{
    api_error, platform_error, require_handle, require_write, snapshot, snapshot_list,
};

/// Input for listing apps (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListAppsInput {}

/// Build the list_apps tool
pub fn list_apps(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_apps")
        .description("List all Aptible apps across every environment")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListAppsInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<ListAppsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let apps = platform
                    .apps
                    .list()
                    .await
                    .map_err(|e| api_error("Failed to list apps", e))?;

                snapshot_list("apps", &apps)
            },
        )
        .build()
}

/// Input for getting one app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAppInput {
    /// Handle of the app
    pub app_handle: String,
    /// Environment the app lives in; required when the handle is used in several environments
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the get_app tool
pub fn get_app(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_app")
        .description(
            "Get an Aptible app by handle. Pass account_handle when the same handle exists \
             in more than one environment.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetAppInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetAppInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let app = platform
                    .find_app(&input.app_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to get app", e))?;

                snapshot(&app)
            },
        )
        .build()
}

// ============================================================================
// Write operations
// ============================================================================

/// Input for creating an app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAppInput {
    /// Handle for the new app
    pub app_handle: String,
    /// Environment to create the app in
    pub account_handle: String,
    /// Docker image to deploy, e.g. `nginx:latest`
    pub docker_image: String,
    /// Maximum seconds to wait for the configure and deploy operations
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the create_app tool
pub fn create_app(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("create_app")
        .description(
            "Create an Aptible app in an environment and deploy a Docker image to it. \
             Blocks until the deploy finishes. FORCE_SSL is enabled on the new app.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, CreateAppInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<CreateAppInput>| async move {
                require_write(&state)?;
                require_handle(&input.app_handle)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let account = platform
                    .account(&input.account_handle)
                    .await
                    .map_err(|e| api_error("Failed to create app", e))?;
                let app = platform
                    .apps
                    .create(&input.app_handle, account.id, Some(&input.docker_image))
                    .await
                    .map_err(|e| api_error("Failed to create app", e))?;

                snapshot(&app)
            },
        )
        .build()
}

/// Input for configuring an app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfigureAppInput {
    /// Handle of the app
    pub app_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
    /// Environment variables to set
    pub env: BTreeMap<String, String>,
    /// Maximum seconds to wait for the configure operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the configure_app tool
pub fn configure_app(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("configure_app")
        .description(
            "Set environment variables on an Aptible app. The app restarts with the new \
             configuration. Blocks until the configure operation finishes.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, ConfigureAppInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<ConfigureAppInput>| async move {
                require_write(&state)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let app = platform
                    .find_app(&input.app_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to configure app", e))?;

                // Values may be secrets; only the keys go back to the caller
                let variables: Vec<String> = input.env.keys().cloned().collect();
                platform
                    .apps
                    .configure(app.id, input.env)
                    .await
                    .map_err(|e| api_error("Failed to configure app", e))?;

                CallToolResult::from_serialize(&json!({
                    "app": app.handle,
                    "status": "configured",
                    "variables": variables,
                }))
            },
        )
        .build()
}

/// Input for deleting an app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteAppInput {
    /// Handle of the app
    pub app_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
    /// Maximum seconds to wait for the deprovision operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the delete_app tool
pub fn delete_app(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("delete_app")
        .description(
            "DANGEROUS: Deprovision an Aptible app, its services and its endpoints. \
             This cannot be undone.",
        )
        .destructive()
        .extractor_handler_typed::<_, _, _, DeleteAppInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<DeleteAppInput>| async move {
                require_write(&state)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let app = platform
                    .find_app(&input.app_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to delete app", e))?;
                platform
                    .apps
                    .delete(app.id)
                    .await
                    .map_err(|e| api_error("Failed to delete app", e))?;

                CallToolResult::from_serialize(&json!({
                    "app": app.handle,
                    "id": app.id,
                    "status": "deprovisioned",
                }))
            },
        )
        .build()
}

/// Build an MCP sub-router containing the app tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_apps(state.clone()))
        .tool(get_app(state.clone()))
        .tool(create_app(state.clone()))
        .tool(configure_app(state.clone()))
        .tool(delete_app(state))
}
