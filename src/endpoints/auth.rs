use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum::middleware as axum_middleware;
use validator::Validate;

use crate::error::Result;
use crate::middleware::{login_rate_limit, Authenticated};
use crate::schemas::{LoginRequest, LoginResponse, TwoFactorRequiredResponse};
use crate::services::authorization::Principal;
use crate::services::{ClientMeta, LoginOutcome};
use crate::state::AppState;

/// Public auth routes
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ))
        .with_state(state)
}

/// Login with username or email and password, plus a 2FA code when enabled
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    request.validate()?;

    let outcome = state
        .auth
        .authenticate_from(
            &request.username,
            &request.password,
            request.totp_code.as_deref(),
            &client,
        )
        .await?;

    match outcome {
        LoginOutcome::Authenticated(issued) => Ok(Json(LoginResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_at: issued.expires_at,
            user: issued.claims.into(),
        })
        .into_response()),
        LoginOutcome::TwoFactorRequired { .. } => Ok(Json(TwoFactorRequiredResponse {
            requires_2fa: true,
            detail: "Two-factor authentication code required".to_string(),
        })
        .into_response()),
    }
}

/// Echo the verified principal
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, body = Principal))
)]
pub async fn me(Authenticated(principal): Authenticated) -> Json<Principal> {
    Json(principal)
}
