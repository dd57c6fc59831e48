use super::env_parse;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub unread_cache_ttl_secs: u64,
    pub expiry_threshold_days: i64,
    pub expiry_scan_interval_secs: u64,
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        Self {
            unread_cache_ttl_secs: env_parse("DMS_UNREAD_CACHE_TTL_SECS", 5),
            expiry_threshold_days: env_parse("DMS_EXPIRY_THRESHOLD_DAYS", 14),
            expiry_scan_interval_secs: env_parse("DMS_EXPIRY_SCAN_INTERVAL_SECS", 3600),
        }
    }
}
