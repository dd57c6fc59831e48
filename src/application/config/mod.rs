pub mod auth;
pub mod database;
pub mod hierarchy;
pub mod notifications;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,
    pub hierarchy: hierarchy::HierarchyConfig,
    pub notifications: notifications::NotificationConfig,

    // Build info
    pub commit_hash: String,
    pub version: String,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            hierarchy: hierarchy::HierarchyConfig::from_env(),
            notifications: notifications::NotificationConfig::from_env(),

            commit_hash: env::var("COMMIT_HASH").unwrap_or_else(|_| "unknown".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: env::var("DMS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("DMS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        }
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Parse an integer env var, falling back to `default` when unset or malformed
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("DMS_TEST_ENV_PARSE", "not-a-number");
        assert_eq!(env_parse("DMS_TEST_ENV_PARSE", 7u32), 7);
        std::env::set_var("DMS_TEST_ENV_PARSE", " 42 ");
        assert_eq!(env_parse("DMS_TEST_ENV_PARSE", 7u32), 42);
        std::env::remove_var("DMS_TEST_ENV_PARSE");
    }
}
