//! Database tools

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

/// Input for listing database images (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListAvailableDatabaseTypesInput {}

/// Build the list_available_database_types tool
pub fn list_available_database_types(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_available_database_types")
        .description(
            "List the database images Aptible offers (type, version, description). \
             create_database needs the id of one of these images.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListAvailableDatabaseTypesInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(_input): Json<ListAvailableDatabaseTypesInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let images = platform
                    .databases
                    .list_available_types()
                    .await
                    .map_err(|e| api_error("Failed to list database types", e))?;

                snapshot_list("database_images", &images)
            },
        )
        .build()
}

/// Input for listing databases (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDatabasesInput {}

/// Build the list_databases tool
pub fn list_databases(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_databases")
        .description("List all Aptible databases across every environment")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListDatabasesInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<ListDatabasesInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let databases = platform
                    .databases
                    .list()
                    .await
                    .map_err(|e| api_error("Failed to list databases", e))?;

                snapshot_list("databases", &databases)
            },
        )
        .build()
}

/// Input for getting one database
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetDatabaseInput {
    /// Handle of the database
    pub database_handle: String,
    /// Environment the database lives in; required when the handle is used in several environments
    #[serde(default)]
    pub account_handle: Option<String>,
}

/// Build the get_database tool
pub fn get_database(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_database")
        .description(
            "Get an Aptible database by handle. Pass account_handle when the same handle \
             exists in more than one environment.",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetDatabaseInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetDatabaseInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let database = platform
                    .find_database(&input.database_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to get database", e))?;

                snapshot(&database)
            },
        )
        .build()
}

// ============================================================================
// Write operations
// ============================================================================

/// Input for creating a database
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDatabaseInput {
    /// Handle for the new database
    pub database_handle: String,
    /// Environment to create the database in
    pub account_handle: String,
    /// Database image id from list_available_database_types
    pub image_id: i64,
    /// Maximum seconds to wait for the provision operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the create_database tool
pub fn create_database(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("create_database")
        .description(
            "Create and provision an Aptible database from a database image. \
             Blocks until provisioning finishes.",
        )
        .non_destructive()
        .extractor_handler_typed::<_, _, _, CreateDatabaseInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<CreateDatabaseInput>| async move {
                require_write(&state)?;
                require_handle(&input.database_handle)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let account = platform
                    .account(&input.account_handle)
                    .await
                    .map_err(|e| api_error("Failed to create database", e))?;
                let database = platform
                    .databases
                    .create(&input.database_handle, account.id, input.image_id)
                    .await
                    .map_err(|e| api_error("Failed to create database", e))?;

                snapshot(&database)
            },
        )
        .build()
}

/// Input for deleting a database
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteDatabaseInput {
    /// Handle of the database
    pub database_handle: String,
    /// Environment the database lives in
    #[serde(default)]
    pub account_handle: Option<String>,
    /// Maximum seconds to wait for the deprovision operation
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Build the delete_database tool
pub fn delete_database(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("delete_database")
        .description(
            "DANGEROUS: Deprovision an Aptible database. All data is lost. This cannot be undone.",
        )
        .destructive()
        .extractor_handler_typed::<_, _, _, DeleteDatabaseInput>(
            state,
            |State(state): State<Arc<AppState>>,
             Json(input): Json<DeleteDatabaseInput>| async move {
                require_write(&state)?;

                let platform = state
                    .platform_with_timeout(input.timeout_seconds)
                    .await
                    .map_err(platform_error)?;
                let database = platform
                    .find_database(&input.database_handle, input.account_handle.as_deref())
                    .await
                    .map_err(|e| api_error("Failed to delete database", e))?;
                platform
                    .databases
                    .delete(database.id)
                    .await
                    .map_err(|e| api_error("Failed to delete database", e))?;

                CallToolResult::from_serialize(&json!({
                    "database": database.handle,
                    "id": database.id,
                    "status": "deprovisioned",
                }))
            },
        )
        .build()
}

/// Build an MCP sub-router containing the database tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_available_database_types(state.clone()))
        .tool(list_databases(state.clone()))
        .tool(get_database(state.clone()))
        .tool(create_database(state.clone()))
        .tool(delete_database(state))
}
