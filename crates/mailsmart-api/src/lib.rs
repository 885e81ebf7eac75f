//! HTTP surface of the Mailsmart panels.
//!
//! The user panel lives at `/`, the admin panel under `/admin`. Both share the
//! message handlers; only the admin panel has user management and accuracy stats.

pub mod access;
pub mod auth;
pub mod classifier;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod messages;
pub mod middleware;
pub mod users;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::AppState;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/health", get(health));

    let panel_routes = Router::new()
        // User panel
        .route("/", get(dashboard::user_dashboard))
        .route("/messages", get(messages::list_own_messages).post(messages::create_message))
        .route("/messages/{id}", get(messages::show_message).put(messages::update_message))
        // Admin panel
        .route("/admin", get(dashboard::admin_dashboard))
        .route(
            "/admin/messages",
            get(messages::list_all_messages).post(messages::create_message),
        )
        .route(
            "/admin/messages/{id}",
            get(messages::show_message).put(messages::update_message),
        )
        .route("/admin/users", get(users::list_users).post(users::create_user))
        .route(
            "/admin/users/{id}",
            get(users::show_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/admin/users/{id}/verify-email", post(users::verify_email))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_panel_access,
        ));

    Router::new()
        .merge(public_routes)
        .merge(panel_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
