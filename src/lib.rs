//! lead-relay: the real-time messaging core behind the agent dashboard
//! and the embeddable visitor widget.

pub mod client;
pub mod core;
pub mod domain;
pub mod dtos;
pub mod gateway;
pub mod rooms;
pub mod services;
pub mod store;

// Re-export the main types to ease imports
pub use crate::core::{AppError, AppState};
pub use crate::services::root;

use crate::core::agent_auth_middleware;
use crate::gateway::{conversation_ws_handler, presence_ws_handler, widget_ws_handler};
use axum::{
    Router, middleware,
    routing::{any, get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Builds the application router: REST surface, socket upgrade
/// endpoints, widget bootstrap.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/conversations", configure_conversation_routes(state.clone()))
        .nest("/ws", configure_ws_routes(state.clone()))
        .route("/widget/session", post(services::start_widget_session))
        // The widget embeds on arbitrary property sites.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Dashboard REST routes; every one of them requires an agent session.
fn configure_conversation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::services::*;

    Router::new()
        .route("/", get(list_conversations))
        .route("/{conversation_id}", get(get_conversation))
        .route(
            "/{conversation_id}/messages",
            get(get_conversation_messages).post(send_message),
        )
        .route("/{conversation_id}/read", post(mark_conversation_read))
        .route("/{conversation_id}/messages/read", post(mark_messages_read))
        .route("/{conversation_id}/archive", post(archive_conversation))
        .route("/{conversation_id}/unarchive", post(unarchive_conversation))
        .layer(middleware::from_fn_with_state(state, agent_auth_middleware))
}

/// Socket upgrade routes. Dashboard sockets authenticate through the
/// agent middleware; the widget socket authenticates with the shared
/// API key inside its own handler (browsers cannot attach headers to a
/// websocket handshake).
fn configure_ws_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let dashboard_routes = Router::new()
        .route("/conversations/{conversation_id}", any(conversation_ws_handler))
        .route("/presence", any(presence_ws_handler))
        .layer(middleware::from_fn_with_state(state, agent_auth_middleware));

    let widget_routes =
        Router::new().route("/widget/{conversation_id}", any(widget_ws_handler));

    dashboard_routes.merge(widget_routes)
}
