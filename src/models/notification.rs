use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub resource_type: String,
    pub resource_id: Option<i64>,
    /// Lifecycle state for expiry notifications (`approaching` / `expired`)
    pub lifecycle: Option<String>,
    pub is_read: bool,
    #[schema(value_type = Option<String>)]
    pub read_at: Option<DateTimeUtc>,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const TYPE_DOCUMENT_EXPIRY: &str = "document_expiry";
pub const TYPE_DIRECTOR_TERM_EXPIRY: &str = "director_term_expiry";

pub const RESOURCE_DOCUMENT: &str = "document";
pub const RESOURCE_DIRECTOR: &str = "director";

/// Lifecycle of an expiring resource relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryLifecycle {
    Approaching,
    Expired,
}

impl ExpiryLifecycle {
    /// `days_until_expiry >= 0` is still approaching; a document expiring today has not expired yet.
    pub fn from_days(days_until_expiry: i64) -> Self {
        if days_until_expiry >= 0 {
            ExpiryLifecycle::Approaching
        } else {
            ExpiryLifecycle::Expired
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryLifecycle::Approaching => "approaching",
            ExpiryLifecycle::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ExpiryLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
