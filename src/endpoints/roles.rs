use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use validator::Validate;

use crate::error::Result;
use crate::middleware::{Authenticated, Authorized, ManageRoles};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::permission;
use crate::schemas::{AssignPermission, CreateRole, RoleResponse, UpdateRole};
use crate::services::{AuditEntry, ClientMeta};
use crate::state::AppState;

/// Create roles routes
pub fn roles_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/{id}", get(get_role).put(update_role).delete(delete_role))
        .route("/{id}/permissions", post(assign_permission))
        .route(
            "/{id}/permissions/{permission_id}",
            delete(revoke_permission),
        )
        .with_state(state)
}

/// Create the permission catalog route
pub fn permissions_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_permissions))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses((status = 200, body = Vec<RoleResponse>))
)]
async fn list_roles(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<Vec<RoleResponse>>> {
    Ok(Json(state.roles.list_roles().await?))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, body = RoleResponse),
        (status = 404, description = "Role not found")
    )
)]
async fn get_role(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<RoleResponse>> {
    Ok(Json(state.roles.get_role_with_permissions(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Roles",
    request_body = CreateRole,
    responses(
        (status = 200, body = RoleResponse),
        (status = 409, description = "Role name already exists")
    )
)]
async fn create_role(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageRoles>,
    client: ClientMeta,
    Json(request): Json<CreateRole>,
) -> Result<Json<RoleResponse>> {
    request.validate()?;
    let created = state.roles.create_role(request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::RoleCreated, ResourceType::Role)
                .resource(created.id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({ "name": created.name })),
        )
        .await;

    Ok(Json(created))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    request_body = UpdateRole,
    responses(
        (status = 200, body = RoleResponse),
        (status = 403, description = "System roles cannot be renamed")
    )
)]
async fn update_role(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageRoles>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRole>,
) -> Result<Json<RoleResponse>> {
    request.validate()?;
    let updated = state.roles.update_role(id, request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::RoleUpdated, ResourceType::Role)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted"),
        (status = 409, description = "Role is assigned to users")
    )
)]
async fn delete_role(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageRoles>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.roles.delete_role(id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::RoleDeleted, ResourceType::Role)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Role deleted" })))
}

#[utoipa::path(
    post,
    path = "/api/roles/{id}/permissions",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role id")),
    request_body = AssignPermission,
    responses((status = 200, body = RoleResponse))
)]
async fn assign_permission(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageRoles>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<AssignPermission>,
) -> Result<Json<RoleResponse>> {
    state
        .roles
        .assign_permission(id, request.permission_id)
        .await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::PermissionAssigned, ResourceType::Role)
                .resource(id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({ "permission_id": request.permission_id })),
        )
        .await;

    Ok(Json(state.roles.get_role_with_permissions(id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{id}/permissions/{permission_id}",
    tag = "Roles",
    params(
        ("id" = i64, Path, description = "Role id"),
        ("permission_id" = i64, Path, description = "Permission id")
    ),
    responses((status = 200, body = RoleResponse))
)]
async fn revoke_permission(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageRoles>,
    client: ClientMeta,
    Path((id, permission_id)): Path<(i64, i64)>,
) -> Result<Json<RoleResponse>> {
    state.roles.revoke_permission(id, permission_id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::PermissionRevoked, ResourceType::Role)
                .resource(id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({ "permission_id": permission_id })),
        )
        .await;

    Ok(Json(state.roles.get_role_with_permissions(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Roles",
    responses((status = 200, body = Vec<permission::Model>))
)]
async fn list_permissions(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<Vec<permission::Model>>> {
    Ok(Json(state.roles.list_permissions().await?))
}
