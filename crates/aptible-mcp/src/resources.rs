//! MCP Resources for the Aptible platform
//!
//! Resources expose read-only data that can be fetched by URI.

use std::sync::Arc;

use aptible_core::Config;
use tower_mcp::McpRouter;
use tower_mcp::protocol::{ReadResourceResult, ResourceContent};
use tower_mcp::resource::{Resource, ResourceBuilder};

use crate::state::AppState;

/// GitHub Actions workflow templates: (slug, display name, description, body)
const WORKFLOW_TEMPLATES: &[(&str, &str, &str, &str)] = &[
    (
        "deploy",
        "Deploy workflow",
        "GitHub Actions workflow that builds an image, pushes it to GHCR and deploys it",
        include_str!("../templates/deploy.yml"),
    ),
    (
        "provision-database",
        "Provision database workflow",
        "GitHub Actions workflow that creates a PostgreSQL database and exports its URL",
        include_str!("../templates/provision-database.yml"),
    ),
    (
        "deprovision-app",
        "Deprovision app workflow",
        "GitHub Actions workflow that removes a review app when its pull request closes",
        include_str!("../templates/deprovision-app.yml"),
    ),
];

/// Build a resource exposing the effective configuration, token masked
pub fn config_resource(config: &Config) -> Resource {
    let text = serde_json::to_string_pretty(&config.redacted())
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string());

    ResourceBuilder::new("aptible://config")
        .name("Configuration")
        .description("Effective server configuration (API URLs, token source, poll settings)")
        .mime_type("application/json")
        .handler(move || {
            let text = text.clone();
            async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri: "aptible://config".to_string(),
                        mime_type: Some("application/json".to_string()),
                        text: Some(text),
                        blob: None,
                        meta: None,
                    }],
                    meta: None,
                })
            }
        })
        .build()
}

/// Build a resource serving one workflow template
fn template_resource(slug: &str, name: &str, description: &str, body: &'static str) -> Resource {
    let uri = format!("aptible://templates/github-actions/{}", slug);
    let content_uri = uri.clone();

    ResourceBuilder::new(uri)
        .name(name)
        .description(description)
        .mime_type("application/yaml")
        .handler(move || {
            let uri = content_uri.clone();
            async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri,
                        mime_type: Some("application/yaml".to_string()),
                        text: Some(body.to_string()),
                        blob: None,
                        meta: None,
                    }],
                    meta: None,
                })
            }
        })
        .build()
}

/// Every workflow template resource
pub fn template_resources() -> Vec<Resource> {
    WORKFLOW_TEMPLATES
        .iter()
        .map(|(slug, name, description, body)| template_resource(slug, name, description, body))
        .collect()
}

/// Build a resource exposing server instructions/help
pub fn help_resource() -> Resource {
    ResourceBuilder::new("aptible://help")
        .name("Help")
        .description("Usage instructions for the Aptible MCP server")
        .mime_type("text/markdown")
        .text(
            r#"# Aptible MCP Server Help

## Concepts

- **Stack**: the cluster an environment runs on (shared or dedicated)
- **Environment (account)**: groups apps and databases; lives on one stack
- **App**: a deployed Docker image, split into services by process type
- **Service**: one process type of an app, scaled independently
- **Endpoint (vhost)**: a public HTTPS entry point for a service
- **Operation**: an asynchronous job (configure, deploy, scale, provision, deprovision)

## Tool Categories

- **Environments**: list_accounts, get_account, get_accounts_by_stack, create_account
- **Stacks**: list_stacks, get_stack
- **Apps**: list_apps, get_app, create_app, configure_app, delete_app
- **Databases**: list_available_database_types, list_databases, get_database,
  create_database, delete_database
- **Services**: list_services, get_service, list_service_vhosts, scale_service
- **Endpoints**: list_vhosts, get_vhost, create_vhost, delete_vhost
- **Operations**: list_app_operations, list_database_operations,
  list_vhost_operations, get_operation_logs

Handles are only unique inside an environment. If a lookup reports
several matches, pass `account_handle`.

Write tools wait for the operation they start. Pass `timeout_seconds`
to bound the wait.

## Prompts

- `deploy_app` - Walk through environment, app, database, configuration and endpoint
- `scale_service` - Inspect a service and scale it

## Resources

- `aptible://help` - This help text
- `aptible://config` - Effective configuration (token masked)
- `aptible://templates/github-actions/deploy` - Build and deploy workflow
- `aptible://templates/github-actions/provision-database` - Database workflow
- `aptible://templates/github-actions/deprovision-app` - Review app teardown workflow
"#,
        )
}

/// Build an MCP sub-router containing every resource
pub fn router(state: Arc<AppState>) -> McpRouter {
    let mut router = McpRouter::new()
        .resource(help_resource())
        .resource(config_resource(state.config()));
    for resource in template_resources() {
        router = router.resource(resource);
    }
    router
}
