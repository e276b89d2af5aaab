//! Common test utilities for API testing with mocks.
//!
//! Builds the real router over a ticket manager whose chat platform and
//! index are in-memory, with transcripts, panels and the creation lock in a
//! temporary data directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ticketdesk_core::{
    load_config_from_str,
    panel::PanelConfig,
    testing::{MemoryEventSink, MemoryIndexStore, MockGateway},
    PanelRegistry, PanelStore, TicketManager,
};
use ticketdesk_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ticketdesk_core::testing::fixtures;

/// Preset id of the static panel's button.
pub const SUPPORT_BUTTON: &str = "support";
pub const TYPE_SELECT: &str = "ticket-type";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_open_ticket() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/tickets", json!({
///         "opener": { "id": "1001", "name": "alice" }
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub manager: Arc<TicketManager>,
    /// Mock guild - inspect channels, overwrites and sent messages
    pub gateway: Arc<MockGateway>,
    pub store: Arc<MemoryIndexStore>,
    pub events: Arc<MemoryEventSink>,
    /// Data directory for transcripts, panels and the lock file
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fixtures::ManagerFixture {
            manager,
            gateway,
            store,
            events,
        } = fixtures::manager_fixture(temp_dir.path());

        let config = load_config_from_str(&format!(
            r#"
[discord]
guild_id = "{}"

[server]
host = "127.0.0.1"
port = 0
"#,
            fixtures::GUILD_ID
        ))
        .expect("Failed to parse test config");

        let panels = Arc::new(PanelRegistry::new(vec![static_panel()]));
        let panel_store = PanelStore::new(temp_dir.path());

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&manager),
            panels,
            panel_store,
            Some(events.handle.clone()),
        ));
        let router = ticketdesk_server::api::create_router(state);

        Self {
            router,
            manager,
            gateway,
            store,
            events: events.sink,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    pub async fn delete_with_body(&self, path: &str, body: Value) -> TestResponse {
        self.request("DELETE", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Open a ticket for `user_id` and return its channel id.
    pub async fn open_ticket(&self, user_id: &str, name: &str) -> String {
        let response = self
            .post(
                "/api/v1/tickets",
                json!({ "opener": { "id": user_id, "name": name } }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["channel_id"]
            .as_str()
            .expect("channel_id in response")
            .to_string()
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// The panel every fixture starts with: one button and one select.
pub fn static_panel() -> PanelConfig {
    serde_json::from_value(json!({
        "id": "main",
        "buttons": [
            { "id": SUPPORT_BUTTON, "label": "Support", "target_id": fixtures::TICKET_CATEGORY }
        ],
        "selects": [
            {
                "id": TYPE_SELECT,
                "options": [
                    {
                        "label": "Billing",
                        "value": "billing",
                        "target_id": fixtures::LOBBY_CHANNEL,
                        "welcome_message": "Billing will be with you shortly."
                    }
                ]
            }
        ]
    }))
    .expect("valid panel")
}

pub fn staff_caps() -> Value {
    json!({ "role_ids": [fixtures::STAFF_ROLE] })
}

pub fn admin_caps() -> Value {
    // Administrator
    json!({ "permissions": 8 })
}
