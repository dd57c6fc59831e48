use std::env;

use super::env_parse;

const DEV_JWT_SECRET: &str = "dms-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl_hours: i64,
    pub totp_issuer: String,
    /// Raw key material for secrets at rest (base64 or hex of 32 bytes)
    pub encryption_key: Option<String>,
    /// Role labels treated as superadmin, compared case-insensitively
    pub superadmin_roles: Vec<String>,
    /// Superadmin created at startup when no user exists yet
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Login attempts allowed per client IP within `login_window_secs`
    pub login_max_attempts: usize,
    pub login_window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let superadmin_roles = env::var("DMS_SUPERADMIN_ROLES")
            .unwrap_or_else(|_| "superadmin,administrator".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            jwt_secret: env::var("DMS_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            jwt_issuer: env::var("DMS_JWT_ISSUER").unwrap_or_else(|_| "dms-backend".to_string()),
            token_ttl_hours: env_parse("DMS_TOKEN_TTL_HOURS", 24),
            totp_issuer: env::var("DMS_TOTP_ISSUER").unwrap_or_else(|_| "DMS App".to_string()),
            encryption_key: env::var("DMS_ENCRYPTION_KEY").ok().filter(|k| !k.trim().is_empty()),
            superadmin_roles,
            bootstrap_admin: bootstrap_admin_from_env(),
            login_max_attempts: env_parse("DMS_LOGIN_MAX_ATTEMPTS", 5),
            login_window_secs: env_parse("DMS_LOGIN_WINDOW_SECS", 60),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let username = env::var("DMS_BOOTSTRAP_ADMIN_USERNAME").ok()?;
    let password = env::var("DMS_BOOTSTRAP_ADMIN_PASSWORD").ok()?;
    if username.trim().is_empty() || password.is_empty() {
        return None;
    }
    let email = env::var("DMS_BOOTSTRAP_ADMIN_EMAIL")
        .unwrap_or_else(|_| format!("{}@localhost", username.trim()));
    Some(BootstrapAdmin {
        username: username.trim().to_string(),
        email,
        password,
    })
}
