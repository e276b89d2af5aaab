use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, panels, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Tickets
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/close", post(tickets::close_ticket))
        .route("/tickets/{id}/members", post(tickets::add_member))
        .route(
            "/tickets/{id}/members/{user_id}",
            delete(tickets::remove_member),
        )
        .route("/tickets/{id}/activity", post(tickets::track_activity))
        // Panels
        .route("/panels", get(panels::list_panels))
        .route(
            "/panels/{id}",
            get(panels::get_panel)
                .put(panels::save_panel)
                .delete(panels::remove_panel),
        )
        // Staff
        .route(
            "/staff-roles",
            get(panels::get_staff_roles).put(panels::set_staff_roles),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
