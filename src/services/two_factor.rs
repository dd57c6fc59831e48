//! TOTP two-factor lifecycle
//!
//! `Unset -> generate -> PendingVerification -> verify -> Enabled -> disable -> Unset`.
//! Secrets and backup codes are stored encrypted; backup codes are single-use
//! and a consumed code is removed from storage in the same update.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::two_factor_auth;
use crate::services::encryption::SecretCipher;
use crate::services::security::{
    generate_backup_codes, generate_totp_secret, get_totp_provisioning_uri,
    get_totp_qr_code_base64, verify_totp,
};
use crate::state::DbConn;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct GeneratedSecret {
    pub secret: String,
    pub provisioning_uri: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub has_secret: bool,
    pub backup_codes_remaining: usize,
}

/// How a login code was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFactor {
    Totp,
    BackupCode,
}

#[derive(Clone)]
pub struct TwoFactorService {
    db: DbConn,
    cipher: SecretCipher,
    issuer: String,
}

impl TwoFactorService {
    pub fn new(db: DbConn, cipher: SecretCipher, issuer: impl Into<String>) -> Self {
        Self {
            db,
            cipher,
            issuer: issuer.into(),
        }
    }

    pub fn from_config(db: DbConn, cipher: SecretCipher) -> Self {
        Self::new(db, cipher, CONFIG.auth.totp_issuer.clone())
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    async fn find_record(&self, user_id: i64) -> Result<Option<two_factor_auth::Model>> {
        Ok(TwoFactorAuth::find()
            .filter(two_factor_auth::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    fn account_label(user_id: i64) -> String {
        format!("user-{}", user_id)
    }

    fn decode_backup_codes(&self, stored: Option<&str>) -> Vec<String> {
        let Some(stored) = stored else {
            return Vec::new();
        };
        let json = self.cipher.decrypt_or_passthrough(stored);
        serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored backup codes are unreadable; treating as empty");
            Vec::new()
        })
    }

    fn encode_backup_codes(&self, codes: &[String]) -> Result<String> {
        self.cipher.encrypt(&serde_json::to_string(codes)?)
    }

    /// Create or replace the secret; always leaves 2FA disabled until verified
    pub async fn generate_secret(&self, user_id: i64, account_label: &str) -> Result<GeneratedSecret> {
        let secret = generate_totp_secret();
        let encrypted = self.cipher.encrypt(&secret)?;
        let now = chrono::Utc::now();

        match self.find_record(user_id).await? {
            Some(existing) => {
                let mut record: two_factor_auth::ActiveModel = existing.into();
                record.secret = Set(encrypted);
                record.enabled = Set(false);
                record.backup_codes = Set(None);
                record.updated_at = Set(now);
                record.update(&self.db).await?;
            }
            None => {
                two_factor_auth::ActiveModel {
                    user_id: Set(user_id),
                    secret: Set(encrypted),
                    enabled: Set(false),
                    backup_codes: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?;
            }
        }

        tracing::info!(user_id, "Generated new 2FA secret");

        Ok(GeneratedSecret {
            provisioning_uri: get_totp_provisioning_uri(&secret, &self.issuer, account_label)?,
            qr_code: get_totp_qr_code_base64(&secret, &self.issuer, account_label)?,
            secret,
        })
    }

    /// Enable 2FA after a valid code; returns a fresh set of backup codes
    pub async fn verify_and_enable(&self, user_id: i64, code: &str) -> Result<Vec<String>> {
        let record = self
            .find_record(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("2FA has not been set up".to_string()))?;

        let secret = self.cipher.decrypt_or_passthrough(&record.secret);
        if !verify_totp(&secret, code, &self.issuer, &Self::account_label(user_id))? {
            tracing::info!(user_id, "2FA enable rejected: invalid code");
            return Err(AppError::BadRequest("Invalid verification code".to_string()));
        }

        let codes = generate_backup_codes();
        let mut active: two_factor_auth::ActiveModel = record.into();
        active.enabled = Set(true);
        active.backup_codes = Set(Some(self.encode_backup_codes(&codes)?));
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.db).await?;

        tracing::info!(user_id, "2FA enabled");
        Ok(codes)
    }

    /// Check a login code: TOTP first, then the backup codes
    pub async fn verify_login(&self, user_id: i64, code: &str) -> Result<LoginFactor> {
        let record = match self.find_record(user_id).await? {
            Some(r) if r.enabled => r,
            _ => return Err(AppError::BadRequest("2FA is not enabled".to_string())),
        };

        let secret = self.cipher.decrypt_or_passthrough(&record.secret);
        if verify_totp(&secret, code, &self.issuer, &Self::account_label(user_id))? {
            return Ok(LoginFactor::Totp);
        }

        let candidate = code.trim().to_uppercase();
        let mut codes = self.decode_backup_codes(record.backup_codes.as_deref());
        let Some(pos) = codes.iter().position(|c| *c == candidate) else {
            return Err(AppError::Unauthorized("Invalid 2FA code".to_string()));
        };
        codes.remove(pos);

        // Conditional on the stored set being unchanged, so a concurrent login
        // with the same code cannot consume it twice.
        let result = TwoFactorAuth::update_many()
            .col_expr(
                two_factor_auth::Column::BackupCodes,
                sea_orm::sea_query::Expr::value(Some(self.encode_backup_codes(&codes)?)),
            )
            .col_expr(
                two_factor_auth::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now()),
            )
            .filter(two_factor_auth::Column::Id.eq(record.id))
            .filter(two_factor_auth::Column::BackupCodes.eq(record.backup_codes.clone()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Unauthorized("Invalid 2FA code".to_string()));
        }

        tracing::info!(user_id, remaining = codes.len(), "Backup code consumed");
        Ok(LoginFactor::BackupCode)
    }

    /// Turn 2FA off; the secret is kept until the next generate
    pub async fn disable(&self, user_id: i64) -> Result<()> {
        let record = self
            .find_record(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("2FA has not been set up".to_string()))?;

        let mut active: two_factor_auth::ActiveModel = record.into();
        active.enabled = Set(false);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.db).await?;

        tracing::info!(user_id, "2FA disabled");
        Ok(())
    }

    pub async fn is_enabled(&self, user_id: i64) -> Result<bool> {
        Ok(self
            .find_record(user_id)
            .await?
            .map(|r| r.enabled)
            .unwrap_or(false))
    }

    pub async fn status(&self, user_id: i64) -> Result<TwoFactorStatus> {
        Ok(match self.find_record(user_id).await? {
            Some(record) => TwoFactorStatus {
                enabled: record.enabled,
                has_secret: true,
                backup_codes_remaining: self
                    .decode_backup_codes(record.backup_codes.as_deref())
                    .len(),
            },
            None => TwoFactorStatus {
                enabled: false,
                has_secret: false,
                backup_codes_remaining: 0,
            },
        })
    }

    /// Decrypted secret, for tests and recovery tooling
    pub async fn current_secret(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self
            .find_record(user_id)
            .await?
            .map(|r| self.cipher.decrypt_or_passthrough(&r.secret)))
    }
}
