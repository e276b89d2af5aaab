//! API tests over the real router with a mock guild.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::{admin_caps, fixtures, staff_caps, TestFixture, SUPPORT_BUTTON, TYPE_SELECT};

// =============================================================================
// Health / config / metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["discord"]["guild_id"], fixtures::GUILD_ID);
    assert!(!response.text.contains("\"token\""));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let fixture = TestFixture::new().await;
    fixture.open_ticket("1001", "alice").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("ticketdesk_open_tickets"));
    assert!(response.text.contains("ticketdesk_tickets_created_total"));
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_ticket_without_preset() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "Alice" } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["channel_name"], "ticket-general-alice");

    let channel_id = response.body["channel_id"].as_str().unwrap();
    let ticket = fixture.get(&format!("/api/v1/tickets/{}", channel_id)).await;
    assert_eq!(ticket.status, StatusCode::OK);
    assert_eq!(ticket.body["opener_id"], "1001");
    assert_eq!(ticket.body["members"], json!(["1001"]));
}

#[tokio::test]
async fn test_create_ticket_from_button() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "alice" }, "preset_id": SUPPORT_BUTTON }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["channel_name"], "ticket-support-alice");

    let created = fixture.gateway.created_channels().await;
    assert_eq!(created[0].parent_id.as_deref(), Some(fixtures::TICKET_CATEGORY));
}

#[tokio::test]
async fn test_create_ticket_from_select_option() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({
                "opener": { "id": "1002", "name": "bob" },
                "select_id": TYPE_SELECT,
                "select_value": "billing"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["channel_name"], "ticket-billing-bob");

    let channel_id = response.body["channel_id"].as_str().unwrap();
    let sent = fixture.gateway.sent_messages(channel_id).await;
    assert_eq!(
        sent[0].embed.as_ref().unwrap().description,
        "Billing will be with you shortly."
    );
}

#[tokio::test]
async fn test_create_ticket_unknown_preset() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "alice" }, "preset_id": "nope" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(fixture.gateway.created_channels().await.is_empty());
}

#[tokio::test]
async fn test_create_ticket_select_without_value() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "alice" }, "select_id": TYPE_SELECT }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_ticket_twice_is_rate_limited() {
    let fixture = TestFixture::new().await;
    fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "alice" } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("minute(s)"));
}

#[tokio::test]
async fn test_create_ticket_malformed_body() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw("/api/v1/tickets", "{not json").await;

    assert!(response.status.is_client_error());
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_list_tickets() {
    let fixture = TestFixture::new().await;
    fixture.open_ticket("1001", "alice").await;
    fixture.open_ticket("1002", "bob").await;

    let response = fixture.get("/api/v1/tickets").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
}

#[tokio::test]
async fn test_get_unknown_ticket() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/tickets/999").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "This channel is not a ticket.");
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test]
async fn test_opener_can_close() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/close", channel_id),
            json!({
                "executor": { "id": "1001", "name": "alice" },
                "reason": "solved"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["opener_id"], "1001");
    assert_eq!(response.body["failed_steps"], json!([]));

    let channel = fixture.gateway.channel(&channel_id).await.unwrap();
    assert_eq!(channel.name, "archived-general-alice");
    assert_eq!(channel.parent_id.as_deref(), Some(fixtures::ARCHIVE_CATEGORY));

    let after = fixture.get(&format!("/api/v1/tickets/{}", channel_id)).await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stranger_cannot_close() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/close", channel_id),
            json!({ "executor": { "id": "1002", "name": "bob" } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(fixture.manager.ticket(&channel_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_staff_can_close_with_stated_closer() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/close", channel_id),
            json!({
                "executor": { "id": "2001", "name": "mod" },
                "capabilities": staff_caps(),
                "stated_closer": "Head Mod"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);

    let sent = fixture.gateway.sent_messages(&channel_id).await;
    let summary = sent.last().unwrap().embed.as_ref().unwrap();
    assert!(summary.description.contains("Head Mod"));
}

#[tokio::test]
async fn test_close_unknown_channel() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/tickets/999/close",
            json!({ "executor": { "id": "2001", "name": "mod" }, "capabilities": staff_caps() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Members
// =============================================================================

#[tokio::test]
async fn test_staff_adds_and_removes_member() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let added = fixture
        .post(
            &format!("/api/v1/tickets/{}/members", channel_id),
            json!({
                "user": { "id": "1003", "name": "carol" },
                "actor": { "id": "2001", "name": "mod" },
                "capabilities": staff_caps()
            }),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["changed"], true);

    let ticket = fixture.get(&format!("/api/v1/tickets/{}", channel_id)).await;
    assert_eq!(ticket.body["members"], json!(["1001", "1003"]));

    let removed = fixture
        .delete_with_body(
            &format!("/api/v1/tickets/{}/members/1003", channel_id),
            json!({ "actor": { "id": "2001", "name": "mod" }, "capabilities": staff_caps() }),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["changed"], true);

    let ticket = fixture.get(&format!("/api/v1/tickets/{}", channel_id)).await;
    assert_eq!(ticket.body["members"], json!(["1001"]));
}

#[tokio::test]
async fn test_member_changes_require_staff() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/members", channel_id),
            json!({
                "user": { "id": "1003", "name": "carol" },
                "actor": { "id": "1001", "name": "alice" }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cannot_remove_opener() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;

    let response = fixture
        .delete_with_body(
            &format!("/api/v1/tickets/{}/members/1001", channel_id),
            json!({ "actor": { "id": "2001", "name": "mod" }, "capabilities": admin_caps() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Activity
// =============================================================================

#[tokio::test]
async fn test_activity_tracking() {
    let fixture = TestFixture::new().await;
    let channel_id = fixture.open_ticket("1001", "alice").await;
    let before = fixture.manager.ticket(&channel_id).await.unwrap().unwrap();

    let message = json!({
        "id": "9001",
        "author_id": "1001",
        "author_tag": "alice",
        "content": "hello?",
        "created_at": Utc::now().to_rfc3339()
    });
    let tracked = fixture
        .post(
            &format!("/api/v1/tickets/{}/activity", channel_id),
            json!({ "message": message }),
        )
        .await;
    let untracked = fixture
        .post("/api/v1/tickets/999/activity", json!({ "message": message }))
        .await;

    assert_eq!(tracked.status, StatusCode::OK);
    assert_eq!(tracked.body["tracked"], true);
    assert_eq!(untracked.body["tracked"], false);

    let after = fixture.manager.ticket(&channel_id).await.unwrap().unwrap();
    assert!(after.last_active_at >= before.last_active_at);
}

// =============================================================================
// Panels and staff roles
// =============================================================================

#[tokio::test]
async fn test_list_static_panels() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/panels").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["panels"][0]["id"], "main");
}

#[tokio::test]
async fn test_saved_panel_is_usable() {
    let fixture = TestFixture::new().await;
    let panel = json!({
        "id": "events",
        "buttons": [{ "id": "event-help", "label": "Event help" }]
    });

    let saved = fixture.put("/api/v1/panels/events", panel).await;
    assert_eq!(saved.status, StatusCode::OK);
    assert!(fixture.temp_dir.path().join("panels/events.json").exists());

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({ "opener": { "id": "1001", "name": "alice" }, "preset_id": "event-help" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["channel_name"], "ticket-event-help-alice");

    let removed = fixture.delete("/api/v1/panels/events").await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let gone = fixture.get("/api/v1/panels/events").await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_panel_id_mismatch() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put("/api/v1/panels/events", json!({ "id": "other" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_unknown_panel() {
    let fixture = TestFixture::new().await;

    let response = fixture.delete("/api/v1/panels/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_staff_roles_requires_elevated_permission() {
    let fixture = TestFixture::new().await;

    let denied = fixture
        .put(
            "/api/v1/staff-roles",
            json!({ "role_ids": ["600"], "capabilities": staff_caps() }),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let allowed = fixture
        .put(
            "/api/v1/staff-roles",
            json!({ "role_ids": ["600"], "capabilities": admin_caps() }),
        )
        .await;
    assert_eq!(allowed.status, StatusCode::OK);

    let roles = fixture.get("/api/v1/staff-roles").await;
    assert_eq!(roles.body["role_ids"], json!(["600"]));
    assert_eq!(fixture.manager.access().staff_roles(), vec!["600".to_string()]);
}

#[test]
fn test_lifecycle_errors_map_to_statuses() {
    use ticketdesk_core::TicketError;
    use ticketdesk_server::api::tickets::ticket_error;

    let (status, body) = ticket_error(TicketError::StillActive("c1".to_string()));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.0.error, "This ticket is active again and was left open.");

    let (status, _) = ticket_error(TicketError::AlreadyClosing("c1".to_string()));
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = ticket_error(TicketError::NotATicket("c1".to_string()));
    assert_eq!(status, StatusCode::NOT_FOUND);
}
