pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::cookies::handlers as cookies;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Account API
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Cookie API
        .route(
            "/api/v1/cookies",
            post(cookies::handle_upload).get(cookies::handle_list),
        )
        .route("/api/v1/cookies/:id", delete(cookies::handle_delete))
        .route("/api/v1/cookies/validate", post(cookies::handle_validate))
        .with_state(state)
}
