use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{permission, role, role_permission, user};
use crate::schemas::{CreateRole, RoleResponse, UpdateRole};
use crate::state::DbConn;

const DEFAULT_ROLE_LEVEL: i32 = 3;

#[derive(Clone)]
pub struct RoleService {
    db: DbConn,
}

impl RoleService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn find_role(&self, id: i64) -> Result<role::Model> {
        Role::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<i64>) -> Result<()> {
        let mut select = Role::find().filter(role::Column::Name.eq(name));
        if let Some(id) = except_id {
            select = select.filter(role::Column::Id.ne(id));
        }
        if select.one(&self.db).await?.is_some() {
            return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
        }
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>> {
        let roles = Role::find()
            .order_by_asc(role::Column::Level)
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?;

        let mut out = Vec::with_capacity(roles.len());
        for r in roles {
            let permissions = r.find_related(Permission).all(&self.db).await?;
            out.push(RoleResponse::from_role_with_permissions(r, permissions));
        }
        Ok(out)
    }

    pub async fn get_role_with_permissions(&self, id: i64) -> Result<RoleResponse> {
        let r = self.find_role(id).await?;
        let permissions = r.find_related(Permission).all(&self.db).await?;
        Ok(RoleResponse::from_role_with_permissions(r, permissions))
    }

    pub async fn role_permission_names(&self, role_id: i64) -> Result<Vec<String>> {
        let r = self.find_role(role_id).await?;
        Ok(r.find_related(Permission)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    pub async fn create_role(&self, request: CreateRole) -> Result<RoleResponse> {
        let name = request.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let now = chrono::Utc::now();
        let created = role::ActiveModel {
            name: Set(name),
            description: Set(request.description),
            level: Set(request.level.unwrap_or(DEFAULT_ROLE_LEVEL)),
            is_system: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        for permission_id in request.permission_ids {
            self.assign_permission(created.id, permission_id).await?;
        }

        tracing::info!(role_id = created.id, name = %created.name, "Role created");
        self.get_role_with_permissions(created.id).await
    }

    /// System roles keep their name; description and level may change
    pub async fn update_role(&self, id: i64, request: UpdateRole) -> Result<RoleResponse> {
        let existing = self.find_role(id).await?;

        let new_name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| *n != existing.name)
            .map(str::to_string);
        if let Some(name) = &new_name {
            if existing.is_system {
                return Err(AppError::Forbidden(
                    "System roles cannot be renamed".to_string(),
                ));
            }
            self.ensure_name_free(name, Some(id)).await?;
        }

        let mut active: role::ActiveModel = existing.into();
        if let Some(name) = new_name {
            active.name = Set(name);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(level) = request.level {
            active.level = Set(level);
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.db).await?;

        self.get_role_with_permissions(id).await
    }

    pub async fn delete_role(&self, id: i64) -> Result<()> {
        let existing = self.find_role(id).await?;
        if existing.is_system {
            return Err(AppError::Forbidden(
                "System roles cannot be deleted".to_string(),
            ));
        }

        let in_use = User::find()
            .filter(user::Column::RoleId.eq(id))
            .count(&self.db)
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Role is assigned to {} user(s)",
                in_use
            )));
        }

        RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&self.db)
            .await?;
        Role::delete_by_id(id).exec(&self.db).await?;

        tracing::info!(role_id = id, "Role deleted");
        Ok(())
    }

    pub async fn list_permissions(&self) -> Result<Vec<permission::Model>> {
        Ok(Permission::find()
            .order_by_asc(permission::Column::Resource)
            .order_by_asc(permission::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Idempotent; granting an already-held permission is a no-op
    pub async fn assign_permission(&self, role_id: i64, permission_id: i64) -> Result<()> {
        self.find_role(role_id).await?;
        Permission::find_by_id(permission_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

        let exists = RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .one(&self.db)
            .await?
            .is_some();
        if exists {
            return Ok(());
        }

        role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    pub async fn revoke_permission(&self, role_id: i64, permission_id: i64) -> Result<()> {
        let result = RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(
                "Permission is not assigned to this role".to_string(),
            ));
        }
        Ok(())
    }
}
