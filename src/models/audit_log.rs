use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[schema(value_type = String)]
    pub timestamp: DateTimeUtc,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    /// JSON string for flexible data
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    // Authentication
    Login,
    LoginFailed,
    TwoFactorEnabled,
    TwoFactorDisabled,
    TwoFactorVerified,
    TwoFactorFailed,

    // Company hierarchy
    CompanyCreated,
    CompanyUpdated,
    CompanyMoved,
    CompanyDeactivated,

    // Role management
    RoleCreated,
    RoleUpdated,
    RoleDeleted,
    PermissionAssigned,
    PermissionRevoked,

    // Reports
    ReportCreated,
    ReportUpdated,
    ReportDeleted,

    // Notifications
    SettingsUpdated,
    ExpiryScan,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::TwoFactorEnabled => "2fa_enabled",
            AuditAction::TwoFactorDisabled => "2fa_disabled",
            AuditAction::TwoFactorVerified => "2fa_verified",
            AuditAction::TwoFactorFailed => "2fa_failed",
            AuditAction::CompanyCreated => "company_created",
            AuditAction::CompanyUpdated => "company_updated",
            AuditAction::CompanyMoved => "company_moved",
            AuditAction::CompanyDeactivated => "company_deactivated",
            AuditAction::RoleCreated => "role_created",
            AuditAction::RoleUpdated => "role_updated",
            AuditAction::RoleDeleted => "role_deleted",
            AuditAction::PermissionAssigned => "permission_assigned",
            AuditAction::PermissionRevoked => "permission_revoked",
            AuditAction::ReportCreated => "report_created",
            AuditAction::ReportUpdated => "report_updated",
            AuditAction::ReportDeleted => "report_deleted",
            AuditAction::SettingsUpdated => "settings_updated",
            AuditAction::ExpiryScan => "expiry_scan",
        };
        write!(f, "{}", s)
    }
}

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Auth,
    User,
    Company,
    Role,
    Report,
    Notification,
    System,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Auth => write!(f, "auth"),
            ResourceType::User => write!(f, "user"),
            ResourceType::Company => write!(f, "company"),
            ResourceType::Role => write!(f, "role"),
            ResourceType::Report => write!(f, "report"),
            ResourceType::Notification => write!(f, "notification"),
            ResourceType::System => write!(f, "system"),
        }
    }
}
