//! Operation history and log tools

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{api_error, platform_error, wrap_list};

/// Input for listing the operations of an app
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListAppOperationsInput {
    /// Handle of the app
    pub app_handle: String,
    /// Environment the app lives in
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the list_app_operations tool
pub fn list_app_operations(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_app_operations")
        .description(
            "List recent operations (configure, deploy, scale, ...) run against an Aptible app \
             with their type and status. Use get_operation_logs to read the output of one.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListAppOperationsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<ListAppOperationsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let app = platform
                    .find_app(&input.app_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to list app operations", e))?;
                let operations = platform
                    .operations
                    .for_app(app.id)
                    .await
                    .map_err(|e| api_error("Failed to list app operations", e))?;

                wrap_list("operations", &operations)
            },
        )
        .build()
}

/// Input for listing the operations of a database
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDatabaseOperationsInput {
    /// Handle of the database
    pub database_handle: String,
    /// Environment the database lives in
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the list_database_operations tool
pub fn list_database_operations(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_database_operations")
        .description("List recent operations run against an Aptible database")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListDatabaseOperationsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<ListDatabaseOperationsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let database = platform
                    .find_database(&input.database_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to list database operations", e))?;
                let operations = platform
                    .operations
                    .for_database(database.id)
                    .await
                    .map_err(|e| api_error("Failed to list database operations", e))?;

                wrap_list("operations", &operations)
            },
        )
        .build()
}

/// Input for listing the operations of an endpoint
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListVhostOperationsInput {
    /// Endpoint id
    pub vhost_id: i64,
}

/// Build the list_vhost_operations tool
pub fn list_vhost_operations(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_vhost_operations")
        .description("List recent operations run against an Aptible endpoint (vhost)")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListVhostOperationsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<ListVhostOperationsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let operations = platform
                    .operations
                    .for_vhost(input.vhost_id)
                    .await
                    .map_err(|e| api_error("Failed to list endpoint operations", e))?;

                wrap_list("operations", &operations)
            },
        )
        .build()
}

/// Input for reading operation logs
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetOperationLogsInput {
    /// Operation id, as returned by the list_*_operations tools
    pub operation_id: i64,
}

/// Build the get_operation_logs tool
pub fn get_operation_logs(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_operation_logs")
        .description(
            "Get the log output of an Aptible operation. Useful for diagnosing a failed \
             deploy or provision.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetOperationLogsInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<GetOperationLogsInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let logs = platform
                    .operations
                    .logs(input.operation_id)
                    .await
                    .map_err(|e| api_error("Failed to get operation logs", e))?;

                Ok(CallToolResult::text(logs))
            },
        )
        .build()
}

/// Build an MCP sub-router containing the operation tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_app_operations(state.clone()))
        .tool(list_database_operations(state.clone()))
        .tool(list_vhost_operations(state.clone()))
        .tool(get_operation_logs(state))
}
