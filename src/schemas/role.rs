use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{permission, role};

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub level: Option<i32>,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct AssignPermission {
    pub permission_id: i64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub level: i32,
    pub is_system: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    pub permissions: Vec<permission::Model>,
}

impl RoleResponse {
    pub fn from_role_with_permissions(role: role::Model, permissions: Vec<permission::Model>) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            level: role.level,
            is_system: role.is_system,
            created_at: role.created_at,
            permissions,
        }
    }
}
