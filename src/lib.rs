//! Campus event sponsorship marketplace: students post events, sponsors
//! discover, filter and save them, and both sides trade interest requests.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod local_store;
pub mod models;
pub mod sample;
pub mod saved;
pub mod state;
pub mod verify;
pub mod viewer;

use std::path::Path;

use axum::{
    routing::{get, post, put},
    Router,
};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn app(app_state: AppState, assets_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .nest_service("/assets", ServeDir::new(assets_dir))
        .route(
            "/api/events",
            get(handlers::get_events).post(handlers::create_event_handler),
        )
        .route("/api/events/{public_id}", get(handlers::get_event_details))
        .route("/api/events/{public_id}/interest", post(handlers::send_interest))
        .route("/api/saved", get(handlers::get_saved))
        .route("/api/saved/merge", post(handlers::merge_saved))
        .route("/api/saved/{event_id}/toggle", post(handlers::toggle_saved))
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route("/api/me/role", put(handlers::set_role))
        .route("/api/inbox", get(handlers::get_inbox))
        .route("/api/requests/{request_id}/accept", post(handlers::accept_request))
        .route("/api/requests/{request_id}/decline", post(handlers::decline_request))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
