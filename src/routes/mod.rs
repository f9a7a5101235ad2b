use axum::{Router, routing::get};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod doc;
pub mod health;

/// Browser-facing routes: checkout forms, receipts and session login.
pub fn create_web_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(checkout::router())
        .merge(auth::web_router())
}

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::api_router())
        .nest("/admin", admin::router())
}
