//! End-to-end behaviour of the managers and poller against a mock API

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aptible_core::{
    ApiClient, CoreError, Platform, PollOptions, ProgressEvent, Resource, ScaleRequest,
    wait_for_operation,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_poll() -> PollOptions {
    PollOptions {
        interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(20),
        timeout: Duration::from_secs(5),
    }
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .api_url(server.uri())
        .auth_url(format!("{}/auth", server.uri()))
        .token("test-token")
        .build()
        .unwrap()
}

fn platform(server: &MockServer) -> Platform {
    Platform::new(client(server), fast_poll())
}

fn href(server: &MockServer, kind: &str, id: i64) -> Value {
    json!({ "href": format!("{}/{}/{}", server.uri(), kind, id) })
}

fn collection(name: &str, items: Vec<Value>) -> Value {
    json!({ "_embedded": { name: items } })
}

async fn mount_get(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_operation_succeeded(server: &MockServer, id: i64) {
    mount_get(
        server,
        &format!("/operations/{}", id),
        json!({"id": id, "status": "succeeded"}),
    )
    .await;
}

// ============================================================================
// Listing and hydration
// ============================================================================

#[tokio::test]
async fn list_sends_paging_params_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stacks"))
        .and(query_param("per_page", "5000"))
        .and(query_param("no_embed", "true"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(
            "stacks",
            vec![json!({"id": 10, "name": "shared-us-east-1", "public": true})],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let stacks = platform(&server).stacks.list().await.unwrap();
    assert_eq!(stacks.len(), 1);
    assert_eq!(stacks[0].name, "shared-us-east-1");
}

#[tokio::test]
async fn list_without_embedded_is_empty() {
    let server = MockServer::start().await;
    mount_get(&server, "/apps", json!({"total_count": 0})).await;

    let apps = platform(&server).apps.list().await.unwrap();
    assert!(apps.is_empty());
}

#[tokio::test]
async fn get_by_id_normalizes_links() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/apps/3",
        json!({
            "id": 3,
            "handle": "web",
            "status": "provisioned",
            "_links": {"account": href(&server, "accounts", 1)}
        }),
    )
    .await;

    let app = platform(&server).apps.get_by_id(3).await.unwrap().unwrap();
    let snapshot = app.snapshot().unwrap();
    assert!(snapshot.get("_links").is_none());
    assert!(snapshot["links"]["account"]["href"].is_string());
    assert_eq!(snapshot["account_id"], 1);
}

#[tokio::test]
async fn get_by_id_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vhosts/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let vhost = platform(&server).vhosts.get_by_id(99).await.unwrap();
    assert!(vhost.is_none());
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("kaboom"))
        .mount(&server)
        .await;

    let err = platform(&server).accounts.list().await.unwrap_err();
    assert!(err.is_server_error());
    assert_eq!(err.to_string(), "API error (500): kaboom");
}

// ============================================================================
// Handle resolution
// ============================================================================

async fn mount_duplicate_apps(server: &MockServer) {
    mount_get(
        server,
        "/apps",
        collection(
            "apps",
            vec![
                json!({"id": 1, "handle": "web", "_links": {"account": href(server, "accounts", 10)}}),
                json!({"id": 2, "handle": "web", "_links": {"account": href(server, "accounts", 20)}}),
            ],
        ),
    )
    .await;
    mount_get(
        server,
        "/accounts",
        collection(
            "accounts",
            vec![
                json!({"id": 10, "handle": "prod"}),
                json!({"id": 20, "handle": "staging"}),
                json!({"id": 30, "handle": "sandbox"}),
            ],
        ),
    )
    .await;
}

#[tokio::test]
async fn duplicate_handles_need_an_account() {
    let server = MockServer::start().await;
    mount_duplicate_apps(&server).await;
    let platform = platform(&server);

    let err = platform.find_app("web", None).await.unwrap_err();
    assert!(matches!(err, CoreError::Ambiguous(_)));

    let app = platform.find_app("web", Some("staging")).await.unwrap();
    assert_eq!(app.id, 2);

    let err = platform.find_app("web", Some("sandbox")).await.unwrap_err();
    assert_eq!(err.to_string(), "No app with handle web in account sandbox.");

    let err = platform.find_app("web", Some("nope")).await.unwrap_err();
    assert_eq!(err.to_string(), "Account nope not found.");

    let err = platform.find_app("api", Some("nope")).await.unwrap_err();
    assert_eq!(err.to_string(), "No app with handle api.");
}

#[tokio::test]
async fn accounts_on_stack_filters_by_stack_link() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/stacks",
        collection("stacks", vec![json!({"id": 10, "name": "x"}), json!({"id": 20, "name": "y"})]),
    )
    .await;
    mount_get(
        &server,
        "/accounts",
        collection(
            "accounts",
            vec![
                json!({"id": 1, "handle": "a", "_links": {"stack": href(&server, "stacks", 10)}}),
                json!({"id": 2, "handle": "b", "_links": {"stack": href(&server, "stacks", 20)}}),
            ],
        ),
    )
    .await;

    let accounts = platform(&server).accounts_on_stack("x").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, 1);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn create_account_on_dedicated_stack_is_production() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/stacks/11",
        json!({"id": 11, "name": "acme", "organization_id": "org-9"}),
    )
    .await;
    mount_get(
        &server,
        "/auth/organizations",
        json!({"_embedded": {"organizations": [{"id": "org-9"}, {"id": "org-10"}]}}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .and(body_json(json!({
            "handle": "acme-prod",
            "stack_id": 11,
            "type": "production",
            "organization_id": "org-9"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 40,
            "handle": "acme-prod",
            "_links": {"stack": href(&server, "stacks", 11)}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = platform(&server).accounts.create("acme-prod", 11).await.unwrap();
    assert_eq!(account.id, 40);
    assert_eq!(account.stack_id(), Some(11));
}

#[tokio::test]
async fn create_app_with_image_configures_then_deploys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/10/apps"))
        .and(body_json(json!({"handle": "web"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "handle": "web",
            "_links": {"account": href(&server, "accounts", 10)}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/apps/5/operations"))
        .and(body_json(json!({
            "type": "configure",
            "env": {"APTIBLE_DOCKER_IMAGE": "nginx:latest", "FORCE_SSL": "1"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 100, "type": "configure"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/apps/5/operations"))
        .and(body_json(json!({"type": "deploy"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 101, "type": "deploy"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_operation_succeeded(&server, 100).await;
    mount_operation_succeeded(&server, 101).await;

    let app = platform(&server)
        .apps
        .create("web", 10, Some("nginx:latest"))
        .await
        .unwrap();
    assert_eq!(app.id, 5);
    assert_eq!(app.account_id().unwrap(), 10);
}

async fn mount_images(server: &MockServer, ids: &[i64]) {
    let images = ids
        .iter()
        .map(|id| json!({"id": id, "type": "postgresql", "version": "16", "description": "PostgreSQL 16"}))
        .collect();
    mount_get(server, "/database_images", collection("database_images", images)).await;
}

#[tokio::test]
async fn create_database_rejects_unknown_image() {
    let server = MockServer::start().await;
    mount_images(&server, &[1, 2]).await;

    let err = platform(&server)
        .databases
        .create("pg", 10, 7)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("No database image found with id 7"));
}

#[tokio::test]
async fn create_database_rejects_duplicate_image() {
    let server = MockServer::start().await;
    mount_images(&server, &[7, 7]).await;

    let err = platform(&server)
        .databases
        .create("pg", 10, 7)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Multiple database images found with id 7"));
}

#[tokio::test]
async fn create_database_posts_image_type_and_provisions() {
    let server = MockServer::start().await;
    mount_images(&server, &[7]).await;
    Mock::given(method("POST"))
        .and(path("/accounts/10/databases"))
        .and(body_json(json!({"handle": "pg", "database_image_id": 7, "type": "postgresql"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 60, "handle": "pg", "type": "postgresql"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/databases/60/operations"))
        .and(body_json(json!({"type": "provision"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 200})))
        .expect(1)
        .mount(&server)
        .await;
    mount_operation_succeeded(&server, 200).await;

    let database = platform(&server).databases.create("pg", 10, 7).await.unwrap();
    assert_eq!(database.id, 60);
}

#[tokio::test]
async fn scale_sends_only_supplied_fields_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/5/operations"))
        .and(body_json(json!({"type": "scale", "container_count": 4})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;
    mount_operation_succeeded(&server, 77).await;
    mount_get(
        &server,
        "/services/5",
        json!({
            "id": 5,
            "handle": "web",
            "container_count": 4,
            "container_memory_limit_mb": 1024,
            "_links": {"app": href(&server, "apps", 3)}
        }),
    )
    .await;

    let service = platform(&server)
        .services
        .scale(
            5,
            ScaleRequest {
                container_count: Some(4),
                container_memory_mb: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(service.container_count, Some(4));
    assert_eq!(service.app_id().unwrap(), 3);
}

#[tokio::test]
async fn scale_without_fields_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = platform(&server)
        .services
        .scale(5, ScaleRequest::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn create_vhost_posts_fixed_body_then_provisions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/9/vhosts"))
        .and(body_json(json!({
            "service_id": 9,
            "type": "http",
            "platform": "alb",
            "load_balancing_algorithm_type": "round_robin",
            "default": true,
            "acme": false,
            "internal": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "status": "pending",
            "_links": {"service": href(&server, "services", 9)}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vhosts/12/operations"))
        .and(body_json(json!({"type": "provision"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 300})))
        .expect(1)
        .mount(&server)
        .await;
    mount_operation_succeeded(&server, 300).await;

    let vhost = platform(&server).vhosts.create(9).await.unwrap();
    assert_eq!(vhost.service_id().unwrap(), 9);
}

#[tokio::test]
async fn delete_app_deprovisions_and_treats_404_as_done() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/apps/5",
        json!({"id": 5, "handle": "web", "_links": {"account": href(&server, "accounts", 1)}}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/apps/5/operations"))
        .and(body_json(json!({"type": "deprovision"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 400})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/400"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    platform(&server).apps.delete(5).await.unwrap();
}

#[tokio::test]
async fn delete_missing_database_names_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/databases/8"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = platform(&server).databases.delete(8).await.unwrap_err();
    assert_eq!(err.to_string(), "No database found with id 8");
}

// ============================================================================
// Operation polling
// ============================================================================

#[tokio::test]
async fn poll_succeeded_on_first_fetch_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "succeeded"})))
        .expect(1)
        .mount(&server)
        .await;

    wait_for_operation(&client(&server), 1, &fast_poll(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn poll_failed_carries_backend_message() {
    let server = MockServer::start().await;
    mount_get(&server, "/operations/2", json!({"status": "failed", "message": "boom"})).await;

    let err = wait_for_operation(&client(&server), 2, &fast_poll(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn poll_failed_without_message_uses_placeholder() {
    let server = MockServer::start().await;
    mount_get(&server, "/operations/2", json!({"status": "failed"})).await;

    let err = wait_for_operation(&client(&server), 2, &fast_poll(), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Operation 2 failed: No error message");
}

#[tokio::test]
async fn poll_gone_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    wait_for_operation(&client(&server), 3, &fast_poll(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn poll_other_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/4"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = wait_for_operation(&client(&server), 4, &fast_poll(), None)
        .await
        .unwrap_err();
    assert!(err.is_server_error());
}

#[tokio::test]
async fn poll_reports_progress_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_operation_succeeded(&server, 5).await;

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    wait_for_operation(
        &client(&server),
        5,
        &fast_poll(),
        Some(Box::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event)
        })),
    )
    .await
    .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&ProgressEvent::Started { operation_id: 5 }));
    assert_eq!(events.last(), Some(&ProgressEvent::Completed { operation_id: 5 }));
    let polls = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Polling { .. }))
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn poll_gives_up_at_deadline() {
    let server = MockServer::start().await;
    mount_get(&server, "/operations/6", json!({"status": "queued"})).await;

    let options = fast_poll().with_timeout(Duration::from_millis(50));
    let err = wait_for_operation(&client(&server), 6, &options, None)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, CoreError::OperationTimeout { id: 6, .. }));
}

// ============================================================================
// Operation history and logs
// ============================================================================

#[tokio::test]
async fn operation_summaries_default_missing_fields() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/apps/5/operations",
        collection(
            "operations",
            vec![
                json!({"id": 1, "type": "deploy", "status": "succeeded"}),
                json!({"id": 2}),
            ],
        ),
    )
    .await;

    let summaries = platform(&server).operations.for_app(5).await.unwrap();
    let rendered = serde_json::to_value(&summaries).unwrap();
    assert_eq!(
        rendered,
        json!([
            {"id": 1, "type": "deploy", "status": "succeeded"},
            {"id": 2, "type": "unknown", "status": "unknown"}
        ])
    );
}

#[tokio::test]
async fn operation_history_requests_the_default_page() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/databases/60/operations",
        collection("operations", vec![json!({"id": 1, "type": "provision"})]),
    )
    .await;

    let summaries = platform(&server).operations.for_database(60).await.unwrap();
    assert_eq!(summaries.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/databases/60/operations");
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn logs_follow_the_returned_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/9/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}/signed/9.log", server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/signed/9.log"))
        .respond_with(ResponseTemplate::new(200).set_body_string("step 1\nstep 2\n"))
        .mount(&server)
        .await;

    let logs = platform(&server).operations.logs(9).await.unwrap();
    assert_eq!(logs, "step 1\nstep 2\n");
}

#[tokio::test]
async fn logs_empty_response_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/9/logs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let logs = platform(&server).operations.logs(9).await.unwrap();
    assert!(logs.starts_with("No logs available for operation 9"));
}
