pub mod audit;
pub mod auth;
pub mod companies;
pub mod notifications;
pub mod reports;
pub mod roles;
pub mod two_factor;

use axum::{middleware as axum_middleware, Router};

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/version", axum::routing::get(get_version))
        .nest("/auth", auth::auth_routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", axum::routing::get(auth::me))
        .nest("/api", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}

/// API routes under /api/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/2fa", two_factor::two_factor_routes(state.clone()))
        .nest("/companies", companies::companies_routes(state.clone()))
        .nest("/roles", roles::roles_routes(state.clone()))
        .nest("/permissions", roles::permissions_routes(state.clone()))
        .nest("/notifications", notifications::notifications_routes(state.clone()))
        .nest("/reports", reports::reports_routes(state.clone()))
        .nest("/audit", audit::audit_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "backend": "rust"
    }))
}
