//! Stack tools

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tower_mcp::extract::{Json, State};
use tower_mcp::{CallToolResult, McpRouter, Tool, ToolBuilder};

use crate::state::AppState;
use crate::tools::{api_error, platform_error, snapshot, snapshot_list};

/// Input for listing stacks (no parameters)
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListStacksInput {}

/// Build the list_stacks tool
pub fn list_stacks(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("list_stacks")
        .description(
            "List Aptible stacks (the clusters environments run on), including region and \
             whether each is shared or dedicated",
        )
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, ListStacksInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(_input): Json<ListStacksInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let stacks = platform
                    .stacks
                    .list()
                    .await
                    .map_err(|e| api_error("Failed to list stacks", e))?;

                snapshot_list("stacks", &stacks)
            },
        )
        .build()
}

/// Input for getting one stack
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetStackInput {
    /// Name of the stack
    pub stack_name: String,
}

/// Build the get_stack tool
pub fn get_stack(state: Arc<AppState>) -> Tool {
    ToolBuilder::new("get_stack")
        .description("Get an Aptible stack by name")
        .read_only()
        .idempotent()
        .extractor_handler_typed::<_, _, _, GetStackInput>(
            state,
            |State(state): State<Arc<AppState>>, Json(input): Json<GetStackInput>| async move {
                let platform = state.platform().await.map_err(platform_error)?;
                let stack = platform
                    .stacks
                    .get(&input.stack_name)
                    .await
                    .map_err(|e| api_error("Failed to get stack", e))?;

                match stack {
                    Some(stack) => snapshot(&stack),
                    None => Ok(CallToolResult::text(format!(
                        "No stack found with name {}.",
                        input.stack_name
                    ))),
                }
            },
        )
        .build()
}

/// Build an MCP sub-router containing the stack tools
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .tool(list_stacks(state.clone()))
        .tool(get_stack(state))
}
