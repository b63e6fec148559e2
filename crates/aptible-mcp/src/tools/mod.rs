//! MCP tools for the Aptible platform
//!
//! Every tool follows the same shape: resolve handles to resources, call
//! one manager, and render the hydrated resources as JSON objects.

use aptible_core::{CoreError, Resource};
use serde::Serialize;
use serde_json::Value;
use tower_mcp::{CallToolResult, Error as McpError, ToolError};

use crate::state::AppState;

pub mod accounts;
pub mod apps;
pub mod databases;
pub mod operations;
pub mod services;
pub mod stacks;
pub mod vhosts;

use std::sync::Arc;

use tower_mcp::McpRouter;

/// Build an MCP router containing every platform tool
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .merge(accounts::router(state.clone()))
        .merge(stacks::router(state.clone()))
        .merge(apps::router(state.clone()))
        .merge(databases::router(state.clone()))
        .merge(services::router(state.clone()))
        .merge(vhosts::router(state.clone()))
        .merge(operations::router(state))
}

/// Wrap a list of items in a JSON object with a domain-specific key and count field.
///
/// The MCP protocol requires `structuredContent` to be a JSON object, not an array.
/// This helper wraps `Vec<T>` results so they serialize as `{ key: [...], "count": N }`
/// instead of a bare `[...]`.
pub fn wrap_list<T: Serialize>(key: &str, items: &[T]) -> Result<CallToolResult, McpError> {
    CallToolResult::from_serialize(&serde_json::json!({ key: items, "count": items.len() }))
}

/// Render one resource with its derived relation ids
pub fn snapshot<T: Resource>(item: &T) -> Result<CallToolResult, McpError> {
    let value = item
        .snapshot()
        .map_err(|e| ToolError::new(format!("Failed to render result: {}", e)))?;
    CallToolResult::from_serialize(&value)
}

/// Render a resource list as `{ key: [...], "count": N }`
pub fn snapshot_list<T: Resource>(key: &str, items: &[T]) -> Result<CallToolResult, McpError> {
    let values = items
        .iter()
        .map(Resource::snapshot)
        .collect::<Result<Vec<Value>, CoreError>>()
        .map_err(|e| ToolError::new(format!("Failed to render result: {}", e)))?;
    wrap_list(key, &values)
}

/// Refuse to run a mutating tool in read-only mode
pub fn require_write(state: &AppState) -> Result<(), McpError> {
    if state.is_write_allowed() {
        Ok(())
    } else {
        Err(McpError::tool(
            crate::error::McpError::ReadOnlyMode.to_string(),
        ))
    }
}

/// Reject an empty handle before any request goes out
pub fn require_handle(handle: &str) -> Result<(), McpError> {
    if handle.is_empty() {
        Err(McpError::tool("Invalid input: A handle is required."))
    } else {
        Ok(())
    }
}

/// Turn a platform failure into a tool error
pub fn api_error(action: &str, err: CoreError) -> ToolError {
    ToolError::new(error_message(action, err))
}

/// Turn a state-level failure (client construction, config) into a tool error
pub fn platform_error(err: crate::error::McpError) -> ToolError {
    match err {
        crate::error::McpError::Platform(core) => {
            api_error("Failed to initialize Aptible client", core)
        }
        other => ToolError::new(format!(
            "Failed to initialize Aptible client.\n\n\
             Suggested actions:\n\
             - Read the aptible://config resource to check the effective configuration\n\
             - Fix the configuration file and restart the server\n\n\
             Error details: {}",
            other
        )),
    }
}

/// Message shown to the caller for a platform failure
///
/// Lookup failures are already phrased for the caller and pass through
/// unchanged. Authentication failures get remediation steps.
fn error_message(action: &str, err: CoreError) -> String {
    if err.is_unauthorized() {
        return credential_message(&err.to_string());
    }
    match err {
        CoreError::NotFound(msg) | CoreError::Ambiguous(msg) => msg,
        CoreError::Validation(msg) => format!("Invalid input: {}", msg),
        other => format!("{}: {}", action, other),
    }
}

/// Format a credential error with remediation guidance for LLMs
fn credential_message(details: &str) -> String {
    let lower = details.to_lowercase();
    let mut output = String::new();

    if lower.contains("not logged in") || lower.contains("token not found") {
        output.push_str("No Aptible credentials available.\n\n");
        output.push_str("Suggested actions:\n");
        output.push_str("- Ask the user to run `aptible login` and restart the server\n");
        output.push_str("- Or set the APTIBLE_TOKEN environment variable for the server process\n");
    } else {
        output.push_str("The Aptible API rejected the current credentials.\n\n");
        output.push_str("Suggested actions:\n");
        output.push_str("- The session may have expired: ask the user to run `aptible login` again\n");
        output.push_str("- Check that the token belongs to the auth server in aptible://config\n");
    }

    output.push_str(&format!("\nError details: {}", details));
    output
}

/// Shared documentation appended to server instructions
pub fn instructions() -> &'static str {
    r#"
### Environments (accounts) and stacks
- list_accounts, get_account, get_accounts_by_stack
- list_stacks, get_stack
- create_account (write)

### Apps
- list_apps, get_app
- create_app, configure_app, delete_app (write)

### Databases
- list_available_database_types, list_databases, get_database
- create_database, delete_database (write)

### Services
- list_services, get_service, list_service_vhosts
- scale_service (write)

### Endpoints (vhosts)
- list_vhosts, get_vhost
- create_vhost, delete_vhost (write)

### Operations
- list_app_operations, list_database_operations, list_vhost_operations
- get_operation_logs

Handles are unique only within an environment. When a lookup reports
several matches, repeat the call with account_handle set.

Write tools block until the platform finishes the operation. Pass
timeout_seconds to bound the wait.
"#
}
