use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::authorization::Principal;

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username or email
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub totp_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    #[schema(value_type = String)]
    pub expires_at: DateTime<Utc>,
    pub user: Principal,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TwoFactorRequiredResponse {
    pub requires_2fa: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct VerifyCodeRequest {
    #[validate(length(min = 6, max = 16))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BackupCodesResponse {
    pub enabled: bool,
    pub backup_codes: Vec<String>,
}
