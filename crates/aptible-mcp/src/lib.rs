//! MCP (Model Context Protocol) server for the Aptible platform
//!
//! This crate exposes Aptible environment, app, database, service, endpoint
//! and operation management as tools for AI systems.
//!
//! ## Binary Usage
//!
//! ```bash
//! # Stdio transport (for desktop assistants and editors)
//! aptible-mcp
//!
//! # Hide and refuse every mutating tool
//! aptible-mcp --read-only
//!
//! # HTTP transport for a shared deployment
//! aptible-mcp --transport http --port 8080
//! ```
//!
//! ## Library Usage
//!
//! You can also embed the tools in your own MCP server:
//!
//! ```no_run
//! use std::sync::Arc;
//! use aptible_core::Config;
//! use aptible_mcp::{AppState, tools};
//! use tower_mcp::McpRouter;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::load()?.with_env_overrides();
//! let state = Arc::new(AppState::new(config, true));
//!
//! let router = McpRouter::new()
//!     .tool(tools::apps::list_apps(state.clone()))
//!     .tool(tools::services::get_service(state.clone()));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tower_mcp::McpRouter;

pub mod error;
pub mod prompts;
pub mod resources;
pub mod state;
pub mod tools;

pub use error::McpError;
pub use state::AppState;

/// Build a router with every tool, resource and prompt
pub fn router(state: Arc<AppState>) -> McpRouter {
    McpRouter::new()
        .merge(tools::router(state.clone()))
        .merge(resources::router(state))
        .prompt(prompts::deploy_app_prompt())
        .prompt(prompts::scale_service_prompt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aptible_core::Config;

    fn test_state(read_only: bool) -> Arc<AppState> {
        Arc::new(AppState::new(Config::default(), read_only))
    }

    #[test]
    fn test_read_tools_are_annotated() {
        let state = test_state(true);
        for tool in [
            tools::accounts::list_accounts(state.clone()),
            tools::apps::get_app(state.clone()),
            tools::operations::get_operation_logs(state.clone()),
            tools::vhosts::get_vhost(state.clone()),
        ] {
            let read_only = tool
                .annotations
                .as_ref()
                .map(|a| a.read_only_hint)
                .unwrap_or(false);
            assert!(read_only);
        }
    }

    #[test]
    fn test_write_tools_are_not_read_only() {
        let state = test_state(false);
        for tool in [
            tools::accounts::create_account(state.clone()),
            tools::apps::create_app(state.clone()),
            tools::apps::configure_app(state.clone()),
            tools::apps::delete_app(state.clone()),
            tools::databases::create_database(state.clone()),
            tools::databases::delete_database(state.clone()),
            tools::services::scale_service(state.clone()),
            tools::vhosts::create_vhost(state.clone()),
            tools::vhosts::delete_vhost(state.clone()),
        ] {
            let read_only = tool
                .annotations
                .as_ref()
                .map(|a| a.read_only_hint)
                .unwrap_or(false);
            assert!(!read_only);
        }
    }

    #[test]
    fn test_router_builds() {
        let _router = router(test_state(false));
    }
}
