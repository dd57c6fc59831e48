//! Password login with an optional second factor

use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::prelude::*;
use crate::models::user;
use crate::services::audit::{AuditEntry, AuditService, ClientMeta};
use crate::services::claims::{ClaimsIssuer, IssuedToken};
use crate::services::security::verify_password;
use crate::services::two_factor::{LoginFactor, TwoFactorService};
use crate::state::DbConn;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(IssuedToken),
    /// Password accepted, but the account needs a TOTP or backup code
    TwoFactorRequired { user_id: i64 },
}

#[derive(Clone)]
pub struct AuthService {
    db: DbConn,
    claims: ClaimsIssuer,
    two_factor: TwoFactorService,
    audit: AuditService,
}

impl AuthService {
    pub fn new(
        db: DbConn,
        claims: ClaimsIssuer,
        two_factor: TwoFactorService,
        audit: AuditService,
    ) -> Self {
        Self {
            db,
            claims,
            two_factor,
            audit,
        }
    }

    async fn reject(
        &self,
        username: &str,
        user_id: Option<i64>,
        reason: &str,
        client: &ClientMeta,
    ) -> AppError {
        self.audit
            .record(
                AuditEntry::new(AuditAction::LoginFailed, ResourceType::Auth)
                    .actor(user_id, Some(username.to_string()))
                    .client(client)
                    .failed(reason),
            )
            .await;
        tracing::info!(username, reason, "Login rejected");
        AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        totp_code: Option<&str>,
    ) -> Result<LoginOutcome> {
        self.authenticate_from(username, password, totp_code, &ClientMeta::default())
            .await
    }

    /// Every credential failure reads the same to the caller. Audit records
    /// carry the caller's address and user agent.
    pub async fn authenticate_from(
        &self,
        username: &str,
        password: &str,
        totp_code: Option<&str>,
        client: &ClientMeta,
    ) -> Result<LoginOutcome> {
        let login = username.trim();
        let found = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(login))
                    .add(user::Column::Email.eq(login)),
            )
            .one(&self.db)
            .await?;

        let account = match found {
            Some(u) if u.is_active => u,
            Some(u) => return Err(self.reject(login, Some(u.id), "account inactive", client).await),
            None => return Err(self.reject(login, None, "unknown user", client).await),
        };

        if !verify_password(password, &account.hashed_password) {
            return Err(self.reject(login, Some(account.id), "bad password", client).await);
        }

        if self.two_factor.is_enabled(account.id).await? {
            let Some(code) = totp_code.map(str::trim).filter(|c| !c.is_empty()) else {
                return Ok(LoginOutcome::TwoFactorRequired {
                    user_id: account.id,
                });
            };

            match self.two_factor.verify_login(account.id, code).await {
                Ok(factor) => {
                    self.audit
                        .record(
                            AuditEntry::new(AuditAction::TwoFactorVerified, ResourceType::Auth)
                                .actor(Some(account.id), Some(account.username.clone()))
                                .client(client)
                                .details(serde_json::json!({
                                    "backup_code": factor == LoginFactor::BackupCode
                                })),
                        )
                        .await;
                }
                Err(AppError::Unauthorized(_)) => {
                    self.audit
                        .record(
                            AuditEntry::new(AuditAction::TwoFactorFailed, ResourceType::Auth)
                                .actor(Some(account.id), Some(account.username.clone()))
                                .client(client)
                                .failed("invalid code"),
                        )
                        .await;
                    return Err(self.reject(login, Some(account.id), "invalid 2FA code", client).await);
                }
                Err(e) => return Err(e),
            }
        }

        let issued = self.claims.issue(account.id).await?;

        self.audit
            .record(
                AuditEntry::new(AuditAction::Login, ResourceType::Auth)
                    .actor(Some(account.id), Some(account.username.clone()))
                    .client(client),
            )
            .await;
        tracing::info!(user_id = account.id, role = %issued.claims.role_name, "User logged in");

        Ok(LoginOutcome::Authenticated(issued))
    }
}
