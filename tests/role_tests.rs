//! Role and permission management tests
//!
//! Covers:
//! - seeded system roles and their grants
//! - creating roles with initial permissions, duplicate names conflict
//! - system roles cannot be renamed or deleted
//! - roles in use cannot be deleted
//! - assigning is idempotent, revoking something unassigned is NotFound

mod common;
use common::{create_test_db, create_test_user};

use dms_backend::error::AppError;
use dms_backend::schemas::{CreateRole, UpdateRole};
use dms_backend::services::RoleService;

async fn permission_id(roles: &RoleService, name: &str) -> i64 {
    roles
        .list_permissions()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| p.id)
        .unwrap_or_else(|| panic!("permission {} not seeded", name))
}

fn new_role(name: &str, permission_ids: Vec<i64>) -> CreateRole {
    CreateRole {
        name: name.to_string(),
        description: Some("custom".to_string()),
        level: None,
        permission_ids,
    }
}

#[tokio::test]
async fn test_seeded_roles() {
    let db = create_test_db().await;
    let roles = RoleService::new(db);

    let all = roles.list_roles().await.unwrap();
    let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["superadmin", "admin", "manager", "staff"]);
    assert!(all.iter().all(|r| r.is_system));

    let manager = all.iter().find(|r| r.name == "manager").unwrap();
    let grants = roles.role_permission_names(manager.id).await.unwrap();
    assert!(grants.contains(&"view_reports".to_string()));
    assert!(!grants.contains(&"manage_reports".to_string()));
}

#[tokio::test]
async fn test_create_role_with_permissions() {
    let db = create_test_db().await;
    let roles = RoleService::new(db);
    let view_reports = permission_id(&roles, "view_reports").await;

    let created = roles
        .create_role(new_role("auditor", vec![view_reports]))
        .await
        .unwrap();
    assert!(!created.is_system);
    assert_eq!(created.level, 3);
    assert_eq!(created.permissions.len(), 1);
    assert_eq!(created.permissions[0].name, "view_reports");

    let err = roles
        .create_role(new_role("auditor", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_system_roles_are_protected() {
    let db = create_test_db().await;
    let roles = RoleService::new(db);
    let admin = roles
        .list_roles()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "admin")
        .unwrap();

    let err = roles
        .update_role(
            admin.id,
            UpdateRole {
                name: Some("boss".to_string()),
                description: None,
                level: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Description changes are fine
    let updated = roles
        .update_role(
            admin.id,
            UpdateRole {
                name: None,
                description: Some("Company administrators".to_string()),
                level: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Company administrators"));

    let err = roles.delete_role(admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_role_in_use_cannot_be_deleted() {
    let db = create_test_db().await;
    let roles = RoleService::new(db.clone());
    let custom = roles.create_role(new_role("auditor", vec![])).await.unwrap();

    create_test_user(&db, "audra", "auditor", None).await;

    let err = roles.delete_role(custom.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_assign_and_revoke() {
    let db = create_test_db().await;
    let roles = RoleService::new(db);
    let custom = roles.create_role(new_role("auditor", vec![])).await.unwrap();
    let view_audit = permission_id(&roles, "view_audit").await;

    roles.assign_permission(custom.id, view_audit).await.unwrap();
    roles.assign_permission(custom.id, view_audit).await.unwrap();
    assert_eq!(
        roles.role_permission_names(custom.id).await.unwrap(),
        vec!["view_audit".to_string()]
    );

    roles.revoke_permission(custom.id, view_audit).await.unwrap();
    let err = roles
        .revoke_permission(custom.id, view_audit)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = roles.assign_permission(custom.id, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    roles.delete_role(custom.id).await.unwrap();
    let err = roles.get_role_with_permissions(custom.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
