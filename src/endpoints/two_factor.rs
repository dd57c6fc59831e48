use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::schemas::{BackupCodesResponse, VerifyCodeRequest};
use crate::services::two_factor::{GeneratedSecret, TwoFactorStatus};
use crate::services::{AuditEntry, ClientMeta};
use crate::state::AppState;

/// Create 2FA routes
pub fn two_factor_routes(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/generate", post(generate))
        .route("/verify", post(verify))
        .route("/disable", post(disable))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/2fa/status",
    tag = "Two-Factor",
    responses((status = 200, body = TwoFactorStatus))
)]
async fn status(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<TwoFactorStatus>> {
    Ok(Json(state.two_factor.status(principal.user_id).await?))
}

/// Generate (or regenerate) a TOTP secret; 2FA stays off until verified
#[utoipa::path(
    post,
    path = "/api/2fa/generate",
    tag = "Two-Factor",
    responses((status = 200, body = GeneratedSecret))
)]
async fn generate(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<GeneratedSecret>> {
    let generated = state
        .two_factor
        .generate_secret(principal.user_id, &principal.username)
        .await?;
    Ok(Json(generated))
}

/// Verify a code against the pending secret and enable 2FA
#[utoipa::path(
    post,
    path = "/api/2fa/verify",
    tag = "Two-Factor",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, body = BackupCodesResponse),
        (status = 400, description = "Invalid verification code")
    )
)]
async fn verify(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    client: ClientMeta,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<BackupCodesResponse>> {
    request.validate()?;
    let backup_codes = state
        .two_factor
        .verify_and_enable(principal.user_id, request.code.trim())
        .await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::TwoFactorEnabled, ResourceType::User)
                .resource(principal.user_id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(BackupCodesResponse {
        enabled: true,
        backup_codes,
    }))
}

#[utoipa::path(
    post,
    path = "/api/2fa/disable",
    tag = "Two-Factor",
    responses((status = 200, body = TwoFactorStatus))
)]
async fn disable(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    client: ClientMeta,
) -> Result<Json<TwoFactorStatus>> {
    state.two_factor.disable(principal.user_id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::TwoFactorDisabled, ResourceType::User)
                .resource(principal.user_id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(state.two_factor.status(principal.user_id).await?))
}
