//! Service tools
//!
//! Services are named after the process types in an app's Procfile (or
//! `cmd` for a single-process image) and are scaled independently.

use std::sync::Arc;

use aptible_core::ScaleRequest;
use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{Error as McpError, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{api_error, platform_error, require_write, snapshot, snapshot_list};

/// Input for listing the services of an app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListServicesInput {
    /// Handle of the app
    pub app_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the list_services tool
pub fn list_services(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_services")
        .description("List the services (process types) of an Aptible app")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListServicesInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<ListServicesInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let app = platform
                    .find_app(&input.app_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to list services", e))?;
                let services = platform
                    .apps
                    .services(app.id)
                    .await
                    .map_err(|e| api_error("Failed to list services", e))?;

                snapshot_list("services", &services)
            },
        )
        .build()
}

/// Input identifying one service
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetServiceInput {
    /// Handle of the app
    pub app_handle: String,
    /// Handle of the service (its process type)
    pub service_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the get_service tool
pub fn get_service(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_service")
        .description(
            "Get one service of an Aptible app, including its container count and memory limit",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetServiceInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetServiceInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let (_, service) = platform
                    .find_service(
                        &input.app_handle,
                        &input.service_handle,
                        input.account_handle.as_deref(),
                    )
                    .await
                    .map_err(|e| api_error("Failed to get service", e))?;

                snapshot(&service)
            },
        )
        .build()
}

/// Input for listing the endpoints of a service
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListServiceVhostsInput {
    /// Handle of the app
    pub app_handle: String,
    /// Handle of the service (its process type)
    pub service_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the list_service_vhosts tool
pub fn list_service_vhosts(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_service_vhosts")
        .description("List the endpoints (vhosts) attached to one service of an Aptible app")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListServiceVhostsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<ListServiceVhostsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let (_, service) = platform
                    .find_service(
                        &input.app_handle,
                        &input.service_handle,
                        input.account_handle.as_deref(),
                    )
                    .await
                    .map_err(|e| api_error("Failed to list service endpoints", e))?;
                let vhosts = platform
                    .vhosts
                    .list_by_service(service.id)
                    .await
                    .map_err(|e| api_error("Failed to list service endpoints", e))?;

                snapshot_list("vhosts", &vhosts)
            },
        )
        .build()
}

/// Input for scaling a service
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScaleServiceInput {
    /// Handle of the app
    pub app_handle: String,
    /// Handle of the service (its process type)
    pub service_handle: String,
    /// New number of containers
    #[serde(default)]
    pub container_count: Option<u32>,
    /// New memory limit per container, in MB
    #[serde(default)]
    pub container_memory_limit_mb: Option<u32>,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
    /// Maximum seconds to wait for the scale operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the scale_service tool
pub fn scale_service(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("scale_service")
        .description(
            "Scale a service of an Aptible app horizontally (container_count), vertically \
             (container_memory_limit_mb), or both. Returns the service after scaling.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, ScaleServiceInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<ScaleServiceInput>| async move {
                require_write(&state)?;

                let request = ScaleRequest {
                    container_count: input.container_count,
                    container_memory_mb: input.container_memory_limit_mb,
                };
                if request.is_empty() {
                    return Err(McpError::tool(
                        "Invalid input: Must specify at least one of container_count or \
                         container_memory_limit_mb",
                    ));
                }

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let (_, service) = platform
                    .find_service(
                        &input.app_handle,
                        &input.service_handle,
                        input.account_handle.as_deref(),
                    )
                    .await
                    .map_err(|e| api_error("Failed to scale service", e))?;
                let scaled = platform
                    .services
                    .scale(service.id, request)
                    .await
                    .map_err(|e| api_error("Failed to scale service", e))?;

                snapshot(&scaled)
            },
        )
        .build()
}

/// Build an MCP sub-router containing the service tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_services(state.clone()))
        .tool(get_service(state.clone()))
        .tool(list_service_vhosts(state.clone()))
        .tool(scale_service(state))
}
