use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        seed_permissions(db).await?;
        seed_roles(db).await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Seeding is not reversible - data may have been modified
        Ok(())
    }
}

/// (name, resource, action, scope, description)
const DEFAULT_PERMISSIONS: &[(&str, &str, &str, &str, &str)] = &[
    ("view_dashboard", "dashboard", "view", "company", "View the dashboard"),
    ("manage_users", "users", "manage", "company", "Create and edit users"),
    ("manage_documents", "documents", "manage", "company", "Upload, edit and delete documents"),
    ("view_documents", "documents", "view", "company", "View documents"),
    ("view_reports", "reports", "view", "company", "View financial reports"),
    ("manage_reports", "reports", "manage", "company", "Create, edit and delete financial reports"),
    ("manage_companies", "companies", "manage", "sub_company", "Create, edit and move companies"),
    ("manage_roles", "roles", "manage", "global", "Manage roles and their permissions"),
    ("view_notifications", "notifications", "view", "company", "View notifications"),
    ("manage_notifications", "notifications", "manage", "global", "Run expiry scans"),
    ("view_audit", "audit", "view", "global", "View the audit log"),
];

/// (role, level, grants); superadmin resolves to the wildcard and carries no rows
const DEFAULT_ROLES: &[(&str, i32, &str, &[&str])] = &[
    ("superadmin", 0, "Unrestricted access across all companies", &[]),
    (
        "admin",
        1,
        "Administers a company and its subsidiaries",
        &[
            "view_dashboard",
            "manage_users",
            "manage_documents",
            "view_documents",
            "view_reports",
            "manage_reports",
            "manage_companies",
            "view_notifications",
        ],
    ),
    (
        "manager",
        2,
        "Reads documents and reports of their company",
        &["view_dashboard", "view_documents", "view_reports", "view_notifications"],
    ),
    (
        "staff",
        3,
        "Works with documents of their company",
        &["view_dashboard", "view_documents", "view_notifications"],
    ),
];

async fn seed_permissions(db: &SchemaManagerConnection<'_>) -> Result<(), DbErr> {
    use crate::models::permission;
    use crate::models::prelude::*;

    if Permission::find().count(db).await? > 0 {
        return Ok(());
    }

    let now = chrono::Utc::now();
    for &(name, resource, action, scope, description) in DEFAULT_PERMISSIONS {
        permission::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(Some(description.to_owned())),
            resource: Set(resource.to_owned()),
            action: Set(action.to_owned()),
            scope: Set(scope.to_owned()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

async fn seed_roles(db: &SchemaManagerConnection<'_>) -> Result<(), DbErr> {
    use crate::models::prelude::*;
    use crate::models::{permission, role, role_permission};

    if Role::find().count(db).await? > 0 {
        return Ok(());
    }

    let now = chrono::Utc::now();
    for &(name, level, description, grants) in DEFAULT_ROLES {
        let created = role::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(Some(description.to_owned())),
            level: Set(level),
            is_system: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for &grant in grants {
            let perm = Permission::find()
                .filter(permission::Column::Name.eq(grant))
                .one(db)
                .await?
                .ok_or_else(|| DbErr::Custom(format!("Permission {} not found", grant)))?;

            role_permission::ActiveModel {
                role_id: Set(created.id),
                permission_id: Set(perm.id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}
