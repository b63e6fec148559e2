//! MCP Prompts for Aptible workflows
//!
//! Prompts provide pre-built templates for common platform operations.

use std::collections::HashMap;

use tower_mcp::prompt::{Prompt, PromptBuilder};
use tower_mcp::protocol::{Content, GetPromptResult, PromptMessage, PromptRole};

/// Build a prompt walking through a first deployment
pub fn deploy_app_prompt() -> Prompt {
    PromptBuilder::new("deploy_app")
        .description("Deploy a Docker image to Aptible with an optional database and endpoint")
        .required_arg("app_handle", "Handle for the app")
        .required_arg("docker_image", "Docker image to deploy, e.g. nginx:latest")
        .optional_arg(
            "account_handle",
            "Environment to deploy into (created if it does not exist)",
        )
        .optional_arg(
            "database_type",
            "Database to provision alongside the app, e.g. postgresql or redis",
        )
        .handler(|args: HashMap<String, String>| async move {
            let app = args.get("app_handle").cloned().unwrap_or_default();
            let image = args.get("docker_image").cloned().unwrap_or_default();
            let account = args.get("account_handle").cloned().unwrap_or_default();
            let database = args.get("database_type").cloned().unwrap_or_default();

            let environment_step = if account.is_empty() {
                "1. Call list_accounts and ask me which environment to use. If none fits, \
                 call list_stacks, pick a stack with me and create one with create_account"
                    .to_string()
            } else {
                format!(
                    "1. Call get_account for \"{}\". If it does not exist, call list_stacks, \
                     pick a stack with me and create it with create_account",
                    account
                )
            };

            let database_step = if database.is_empty() {
                "3. Skip the database unless I ask for one".to_string()
            } else {
                format!(
                    "3. Call list_available_database_types, choose the newest {} image and \
                     create a database named \"{}-db\" with create_database. Read its \
                     connection details with get_database",
                    database, app
                )
            };

            let prompt_text = format!(
                r#"I want to deploy the Docker image "{image}" to Aptible as an app named "{app}".

Please walk me through it:

{environment_step}
2. Create the app with create_app (app_handle "{app}", docker_image "{image}").
   This waits for the deploy to finish
{database_step}
4. Set any environment variables the app needs with configure_app. Never echo
   secret values back to me
5. Call list_services for the app, then expose the web service with create_vhost
6. Report the endpoint domain from get_vhost

If any step fails, call list_app_operations and get_operation_logs on the
latest operation to explain what went wrong before retrying."#
            );

            Ok(GetPromptResult {
                description: Some(format!("Deploy {} to Aptible", app)),
                messages: vec![PromptMessage {
                    role: PromptRole::User,
                    content: Content::Text {
                        text: prompt_text,
                        annotations: None,
                        meta: None,
                    },
                    meta: None,
                }],
                meta: None,
            })
        })
        .build()
}

/// Build a prompt for scaling a service
pub fn scale_service_prompt() -> Prompt {
    PromptBuilder::new("scale_service")
        .description("Inspect an Aptible service and scale it")
        .required_arg("app_handle", "Handle of the app")
        .required_arg("service_handle", "Service (process type) to scale, e.g. web or cmd")
        .optional_arg("goal", "What the scaling should achieve, e.g. handle 2x traffic")
        .handler(|args: HashMap<String, String>| async move {
            let app = args.get("app_handle").cloned().unwrap_or_default();
            let service = args.get("service_handle").cloned().unwrap_or_default();
            let goal = args.get("goal").cloned().unwrap_or_default();

            let goal_line = if goal.is_empty() {
                String::new()
            } else {
                format!("\n**Goal**: {}\n", goal)
            };

            let prompt_text = format!(
                r#"I need to scale the "{service}" service of the Aptible app "{app}".
{goal_line}
Please:

1. Call get_service to read the current container count and memory limit
2. Call list_app_operations to check that no deploy or scale is in progress
3. Propose a new container_count and/or container_memory_limit_mb and explain
   the trade-off. Horizontal scaling adds redundancy; vertical scaling helps
   memory-bound processes
4. After I confirm, call scale_service with only the values that change
5. Show the service as returned by scale_service"#
            );

            Ok(GetPromptResult {
                description: Some(format!("Scale {}/{}", app, service)),
                messages: vec![PromptMessage {
                    role: PromptRole::User,
                    content: Content::Text {
                        text: prompt_text,
                        annotations: None,
                        meta: None,
                    },
                    meta: None,
                }],
                meta: None,
            })
        })
        .build()
}
