//! Ticket API handlers.
//!
//! These are the commands the chat event bridge forwards: panel button and
//! select presses, close requests, member management and message activity.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use ticketdesk_core::{
    gateway::ChannelMessage,
    lifecycle::{ClosedTicket, CreatedTicket},
    panel::TicketPreset,
    CloseRequest, MemberCapabilities, TicketError, TicketRecord, UserRef,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for opening a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub opener: UserRef,
    /// Button preset id, as pressed on a panel
    pub preset_id: Option<String>,
    /// Select menu id and chosen value
    pub select_id: Option<String>,
    pub select_value: Option<String>,
}

/// Request body for closing a ticket
#[derive(Debug, Deserialize)]
pub struct CloseTicketBody {
    /// Who pressed close
    pub executor: UserRef,
    #[serde(default)]
    pub capabilities: MemberCapabilities,
    pub reason: Option<String>,
    /// Name typed into the close form, if any
    pub stated_closer: Option<String>,
}

/// Request body for adding a member
#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
    pub user: UserRef,
    pub actor: UserRef,
    #[serde(default)]
    pub capabilities: MemberCapabilities,
}

/// Request body for removing a member
#[derive(Debug, Deserialize)]
pub struct RemoveMemberBody {
    /// Display name is optional; only the id matters for removal
    pub user_name: Option<String>,
    pub actor: UserRef,
    #[serde(default)]
    pub capabilities: MemberCapabilities,
}

/// Request body for reporting activity
#[derive(Debug, Deserialize)]
pub struct ActivityBody {
    pub message: ChannelMessage,
}

/// Response for ticket queries
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub channel_id: String,
    pub opener_id: String,
    pub created_at: String,
    pub last_active_at: String,
    pub members: Vec<String>,
    pub welcome_message_id: Option<String>,
}

impl From<TicketRecord> for TicketResponse {
    fn from(record: TicketRecord) -> Self {
        Self {
            channel_id: record.channel_id,
            opener_id: record.opener_id,
            created_at: record.created_at.to_rfc3339(),
            last_active_at: record.last_active_at.to_rfc3339(),
            members: record.members,
            welcome_message_id: record.welcome_message_id,
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: usize,
}

/// Response for a close
#[derive(Debug, Serialize)]
pub struct CloseTicketResponse {
    pub channel_id: String,
    pub opener_id: String,
    pub transcript_path: Option<PathBuf>,
    pub failed_steps: Vec<String>,
}

impl From<ClosedTicket> for CloseTicketResponse {
    fn from(closed: ClosedTicket) -> Self {
        Self {
            channel_id: closed.channel_id,
            opener_id: closed.opener_id,
            transcript_path: closed.transcript_path,
            failed_steps: closed.failed_steps,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberChangeResponse {
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub tracked: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a lifecycle error to a status and its user-facing message.
pub fn ticket_error(e: TicketError) -> ApiError {
    let status = match &e {
        TicketError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        TicketError::AlreadyCreating
        | TicketError::LockBusy
        | TicketError::AlreadyOpen { .. }
        | TicketError::ChannelNameCollision { .. }
        | TicketError::AlreadyClosing(_)
        | TicketError::StillActive(_) => StatusCode::CONFLICT,
        TicketError::NotATicket(_) => StatusCode::NOT_FOUND,
        TicketError::CannotRemoveOpener => StatusCode::BAD_REQUEST,
        TicketError::TransientCollaboratorFailure(_) => StatusCode::BAD_GATEWAY,
        TicketError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Ticket operation failed: {}", e);
    }
    api_error(status, e.user_message())
}

fn forbidden() -> ApiError {
    api_error(
        StatusCode::FORBIDDEN,
        "You do not have permission to do this.",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<CreatedTicket>), ApiError> {
    let preset = resolve_preset(&state, &body).await?;
    let created = state
        .manager()
        .create_ticket(&body.opener, preset.as_ref())
        .await
        .map_err(ticket_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn resolve_preset(
    state: &AppState,
    body: &CreateTicketBody,
) -> Result<Option<TicketPreset>, ApiError> {
    let preset = match (&body.preset_id, &body.select_id, &body.select_value) {
        (Some(preset_id), _, _) => state.panels().button_preset(preset_id).await,
        (None, Some(select_id), Some(value)) => {
            state.panels().select_preset(select_id, value).await
        }
        (None, Some(_), None) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "select_value is required with select_id",
            ))
        }
        (None, None, _) => return Ok(None),
    };
    preset
        .map(Some)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Unknown ticket type."))
}

/// Get a ticket by channel id
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    match state.manager().ticket(&channel_id).await {
        Ok(Some(record)) => Ok(Json(TicketResponse::from(record))),
        Ok(None) => Err(ticket_error(TicketError::NotATicket(channel_id))),
        Err(e) => Err(ticket_error(e)),
    }
}

/// List open tickets
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let records = state.manager().tickets().await.map_err(ticket_error)?;
    let total = records.len();
    Ok(Json(ListTicketsResponse {
        tickets: records.into_iter().map(TicketResponse::from).collect(),
        total,
    }))
}

/// Close a ticket. Staff or the opener only.
pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<CloseTicketBody>,
) -> Result<Json<CloseTicketResponse>, ApiError> {
    let record = state
        .manager()
        .ticket(&channel_id)
        .await
        .map_err(ticket_error)?
        .ok_or_else(|| ticket_error(TicketError::NotATicket(channel_id.clone())))?;
    if !state
        .access()
        .can_close(&body.capabilities, &body.executor.id, &record)
    {
        return Err(forbidden());
    }

    let mut request = CloseRequest::manual(body.executor);
    request.reason = body.reason;
    request.stated_closer = body.stated_closer;

    let closed = state
        .manager()
        .close_ticket(&channel_id, request)
        .await
        .map_err(ticket_error)?;
    Ok(Json(CloseTicketResponse::from(closed)))
}

/// Add a member to a ticket. Staff only.
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<AddMemberBody>,
) -> Result<Json<MemberChangeResponse>, ApiError> {
    if !state.access().is_staff(&body.capabilities) {
        return Err(forbidden());
    }
    let changed = state
        .manager()
        .add_member(&channel_id, &body.user, &body.actor)
        .await
        .map_err(ticket_error)?;
    Ok(Json(MemberChangeResponse { changed }))
}

/// Remove a member from a ticket. Staff only.
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((channel_id, user_id)): Path<(String, String)>,
    Json(body): Json<RemoveMemberBody>,
) -> Result<Json<MemberChangeResponse>, ApiError> {
    if !state.access().is_staff(&body.capabilities) {
        return Err(forbidden());
    }
    let user = UserRef::new(user_id.clone(), body.user_name.unwrap_or(user_id));
    let changed = state
        .manager()
        .remove_member(&channel_id, &user, &body.actor)
        .await
        .map_err(ticket_error)?;
    Ok(Json(MemberChangeResponse { changed }))
}

/// Report a message posted in a channel
pub async fn track_activity(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<ActivityBody>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let tracked = state
        .manager()
        .track_activity(&channel_id, &body.message)
        .await
        .map_err(ticket_error)?;
    Ok(Json(ActivityResponse { tracked }))
}
