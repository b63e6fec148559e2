//! Endpoint (vhost) tools
//!
//! Only default HTTPS endpoints on the platform-managed domain can be
//! created here.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{api_error, platform_error, require_write, snapshot, snapshot_list};

/// Input for listing endpoints (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListVhostsInput {}

/// Build the list_vhosts tool
pub fn list_vhosts(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_vhosts")
        .description("List all Aptible endpoints (vhosts) across every environment")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListVhostsInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<ListVhostsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let vhosts = platform
                    .vhosts
                    .list()
                    .await
                    .map_err(|e| api_error("Failed to list endpoints", e))?;

                snapshot_list("vhosts", &vhosts)
            },
        )
        .build()
}

/// Input for getting one endpoint
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetVhostInput {
    /// Endpoint id
    pub vhost_id: i64,
}

/// Build the get_vhost tool
pub fn get_vhost(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_vhost")
        .description("Get an Aptible endpoint (vhost) by id, including its domain and status")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetVhostInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetVhostInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let vhost = platform
                    .vhosts
                    .get_by_id(input.vhost_id)
                    .await
                    .map_err(|e| api_error("Failed to get endpoint", e))?;

                match vhost {
                    Some(vhost) => snapshot(&vhost),
                    None => Ok(CallToolResult::text(format!(
                        "No vhost found with id {}.",
                        input.vhost_id
                    ))),
                }
            },
        )
        .build()
}

/// Input for creating an endpoint
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateVhostInput {
    /// Handle of the app
    pub app_handle: String,
    /// Handle of the service to expose (its process type)
    pub service_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
    /// Maximum seconds to wait for the provision operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the create_vhost tool
pub fn create_vhost(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("create_vhost")
        .description(
            "Expose a service of an Aptible app through a public HTTPS endpoint on the \
             default platform domain. Blocks until the endpoint is provisioned.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, CreateVhostInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<CreateVhostInput>| async move {
                require_write(&state)?;

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
                    .map_err(|e| api_error("Failed to create endpoint", e))?;
                let vhost = platform
                    .vhosts
                    .create(service.id)
                    .await
                    .map_err(|e| api_error("Failed to create endpoint", e))?;

                snapshot(&vhost)
            },
        )
        .build()
}

/// Input for deleting an endpoint
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteVhostInput {
    /// Endpoint id
    pub vhost_id: i64,
    /// Maximum seconds to wait for the deprovision operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the delete_vhost tool
pub fn delete_vhost(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("delete_vhost")
        .description(
            "DANGEROUS: Deprovision an Aptible endpoint (vhost). Traffic to its domain stops.",
        )
        .destructive()
        .extractor_handler_typed::<_, _, _, DeleteVhostInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<DeleteVhostInput>| async move {
                require_write(&state)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                platform
                    .vhosts
                    .delete(input.vhost_id)
                    .await
                    .map_err(|e| api_error("Failed to delete endpoint", e))?;

                CallToolResult::from_serialize(&json!({
                    "id": input.vhost_id,
                    "status": "deprovisioned",
                }))
            },
        )
        .build()
}

/// Build an MCP sub-router containing the endpoint tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_vhosts(state.clone()))
        .tool(get_vhost(state.clone()))
        .tool(create_vhost(state.clone()))
        .tool(delete_vhost(state))
}
