//! Panel and staff-role management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use ticketdesk_core::{panel::PanelConfig, panel::PanelError, MemberCapabilities, TicketEvent};

use super::tickets::ErrorResponse;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn panel_error(e: PanelError) -> ApiError {
    let status = match e {
        PanelError::InvalidId(_) => StatusCode::BAD_REQUEST,
        _ => {
            warn!("Panel storage failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ListPanelsResponse {
    pub panels: Vec<PanelConfig>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct StaffRolesBody {
    pub role_ids: Vec<String>,
    #[serde(default)]
    pub capabilities: MemberCapabilities,
}

#[derive(Debug, Serialize)]
pub struct StaffRolesResponse {
    pub role_ids: Vec<String>,
}

/// Reload dynamic panels into the registry after a store change.
async fn refresh_registry(state: &AppState) -> Result<(), ApiError> {
    let panels = state.panel_store().list().await.map_err(panel_error)?;
    state.panels().set_dynamic(panels).await;
    Ok(())
}

/// All panels, static and dynamic.
pub async fn list_panels(State(state): State<Arc<AppState>>) -> Json<ListPanelsResponse> {
    let panels = state.panels().panels().await;
    let total = panels.len();
    Json(ListPanelsResponse { panels, total })
}

pub async fn get_panel(
    State(state): State<Arc<AppState>>,
    Path(panel_id): Path<String>,
) -> Result<Json<PanelConfig>, ApiError> {
    state.panels().panel(&panel_id).await.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Panel not found: {}", panel_id),
            }),
        )
    })
}

/// Create or replace a dynamic panel.
pub async fn save_panel(
    State(state): State<Arc<AppState>>,
    Path(panel_id): Path<String>,
    Json(panel): Json<PanelConfig>,
) -> Result<Json<PanelConfig>, ApiError> {
    if panel.id != panel_id {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Panel id {:?} does not match path {:?}", panel.id, panel_id),
            }),
        ));
    }

    state.panel_store().save(&panel).await.map_err(panel_error)?;
    refresh_registry(&state).await?;

    info!(panel_id = %panel.id, "Panel saved");
    state.emit(TicketEvent::PanelSaved {
        panel_id: panel.id.clone(),
    });
    Ok(Json(panel))
}

/// Delete a dynamic panel. Static panels cannot be removed here.
pub async fn remove_panel(
    State(state): State<Arc<AppState>>,
    Path(panel_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .panel_store()
        .remove(&panel_id)
        .await
        .map_err(panel_error)?;
    if !removed {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Panel not found: {}", panel_id),
            }),
        ));
    }
    refresh_registry(&state).await?;

    info!(panel_id = %panel_id, "Panel removed");
    state.emit(TicketEvent::PanelRemoved { panel_id });
    Ok(StatusCode::NO_CONTENT)
}

/// Current staff roles.
pub async fn get_staff_roles(State(state): State<Arc<AppState>>) -> Json<StaffRolesResponse> {
    Json(StaffRolesResponse {
        role_ids: state.access().staff_roles(),
    })
}

/// Replace the staff role set. Requires Administrator or Manage Channels.
pub async fn set_staff_roles(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StaffRolesBody>,
) -> Result<Json<StaffRolesResponse>, ApiError> {
    let elevated = body
        .capabilities
        .permissions
        .is_some_and(|p| state.access().has_elevated_permission(p));
    if !elevated {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You do not have permission to do this.".to_string(),
            }),
        ));
    }

    state.access().set_staff_roles(body.role_ids.clone());
    info!(role_ids = ?body.role_ids, "Staff roles updated");
    state.emit(TicketEvent::StaffRolesChanged {
        role_ids: body.role_ids.clone(),
    });
    Ok(Json(StaffRolesResponse {
        role_ids: body.role_ids,
    }))
}
