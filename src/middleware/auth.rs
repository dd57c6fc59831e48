//! Bearer-token authentication for protected routes
//!
//! The token is verified and its embedded claims become the request's
//! principal. No database access happens here.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::services::authorization::Principal;
use crate::state::AppState;

/// Verified principal stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Returns 401 when the token is missing, malformed, expired or badly signed.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_bearer_token(&req) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    let principal = match state.claims.verify(&token) {
        Ok(p) => p,
        Err(_) => return unauthorized_response("Invalid or expired token"),
    };

    tracing::trace!(user_id = principal.user_id, "Request authenticated");
    req.extensions_mut().insert(AuthenticatedPrincipal(principal));

    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "detail": message
        })),
    )
        .into_response()
}
