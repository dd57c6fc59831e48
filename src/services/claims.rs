//! Signed credentials
//!
//! At login the user's role, company and flattened permission list are
//! resolved once and embedded in an HS256 token. Protected routes verify the
//! token and never touch the role tables again, so a token is a point-in-time
//! snapshot until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{EntityTrait, ModelTrait};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::permission::PermissionScope;
use crate::models::prelude::*;
use crate::services::authorization::{
    default_permissions_for, AuthorizationEngine, Principal, WILDCARD_PERMISSION,
};
use crate::state::DbConn;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub role_id: Option<i64>,
    pub role_name: String,
    pub company_id: Option<i64>,
    pub company_level: Option<i32>,
    pub hierarchy_scope: PermissionScope,
    pub permissions: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            user_id: claims.user_id,
            username: claims.username,
            role_id: claims.role_id,
            role_name: claims.role_name,
            company_id: claims.company_id,
            company_level: claims.company_level,
            hierarchy_scope: claims.hierarchy_scope,
            permissions: claims.permissions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub claims: Claims,
}

/// Level 0 (or no company) is global, level 1 company, anything deeper sub-company
pub fn hierarchy_scope_for(company_level: Option<i32>) -> PermissionScope {
    match company_level {
        None | Some(i32::MIN..=0) => PermissionScope::Global,
        Some(1) => PermissionScope::Company,
        Some(_) => PermissionScope::SubCompany,
    }
}

#[derive(Clone)]
pub struct ClaimsIssuer {
    db: DbConn,
    engine: AuthorizationEngine,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl ClaimsIssuer {
    pub fn new(
        db: DbConn,
        engine: AuthorizationEngine,
        secret: &str,
        issuer: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            db,
            engine,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn from_config(db: DbConn, engine: AuthorizationEngine) -> Self {
        Self::new(
            db,
            engine,
            &CONFIG.auth.jwt_secret,
            CONFIG.auth.jwt_issuer.clone(),
            Duration::hours(CONFIG.auth.token_ttl_hours),
        )
    }

    /// Resolve the user's role, company and permissions into a principal
    pub async fn resolve_principal(&self, user_id: i64) -> Result<Principal> {
        let user = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let role = match user.role_id {
            Some(_) => user.find_related(Role).one(&self.db).await.map_err(|e| {
                AppError::Internal(format!("Failed to resolve role for user {}: {}", user.id, e))
            })?,
            None => None,
        };

        let role_name = match &role {
            Some(r) => r.name.clone(),
            None if !user.role.trim().is_empty() => user.role.clone(),
            None => "user".to_string(),
        };

        let permissions = if self.engine.is_super_admin_like(&role_name) {
            vec![WILDCARD_PERMISSION.to_string()]
        } else {
            let granted = match &role {
                Some(r) => r
                    .find_related(Permission)
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(|p| p.name)
                    .collect(),
                None => Vec::new(),
            };
            if granted.is_empty() {
                default_permissions_for(&role_name)
            } else {
                granted
            }
        };

        let company_level = match user.company_id {
            Some(company_id) => Company::find_by_id(company_id)
                .one(&self.db)
                .await?
                .map(|c| c.level),
            None => None,
        };

        Ok(Principal {
            user_id: user.id,
            username: user.username,
            role_id: role.as_ref().map(|r| r.id),
            role_name,
            company_id: user.company_id,
            company_level,
            hierarchy_scope: hierarchy_scope_for(company_level),
            permissions,
        })
    }

    pub async fn issue(&self, user_id: i64) -> Result<IssuedToken> {
        let principal = self.resolve_principal(user_id).await?;
        self.sign(principal)
    }

    /// Sign an already-resolved principal
    pub fn sign(&self, principal: Principal) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: principal.user_id.to_string(),
            user_id: principal.user_id,
            username: principal.username,
            role_id: principal.role_id,
            role_name: principal.role_name,
            company_id: principal.company_id,
            company_level: principal.company_level,
            hierarchy_scope: principal.hierarchy_scope,
            permissions: principal.permissions,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_at,
            claims,
        })
    }

    /// Decode and validate a token; every failure is `Unauthorized`
    pub fn verify(&self, token: &str) -> Result<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}
