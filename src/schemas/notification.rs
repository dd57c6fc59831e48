use serde::{Deserialize, Serialize};
use validator::Validate;

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateSettingsRequest {
    pub email_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,
    #[validate(range(min = 1, max = 365))]
    pub expiry_threshold_days: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub unread_only: Option<bool>,
    pub days_until_expiry: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct CheckExpiryRequest {
    #[validate(range(min = 1, max = 365))]
    pub threshold_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CheckExpiryResponse {
    pub documents_found: usize,
    pub document_notifications_created: usize,
    pub directors_found: usize,
    pub director_notifications_created: usize,
    pub threshold_days: i64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AffectedResponse {
    pub affected: u64,
}
