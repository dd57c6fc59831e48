use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{Authenticated, Authorized, ManageCompanies};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::company;
use crate::schemas::{CreateCompany, MoveCompany, MoveCompanyResponse, UpdateCompany};
use crate::services::authorization::{Principal, VisibleCompanies};
use crate::services::{AuditEntry, ClientMeta};
use crate::state::AppState;

/// Create company routes
pub fn companies_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/{id}",
            get(get_company).put(update_company).delete(deactivate_company),
        )
        .route("/{id}/move", post(move_company))
        .route("/{id}/children", get(get_children))
        .route("/{id}/descendants", get(get_descendants))
        .route("/{id}/ancestors", get(get_ancestors))
        .with_state(state)
}

async fn ensure_company_access(state: &AppState, principal: &Principal, id: i64) -> Result<()> {
    if state
        .engine
        .can_access_company(&state.hierarchy, principal, id)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::access_denied())
    }
}

/// Companies visible to the caller
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses((status = 200, body = Vec<company::Model>))
)]
async fn list_companies(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<company::Model>>> {
    let all = state.hierarchy.get_all().await?;
    let visible = state
        .engine
        .resolve_visible_company_set(&state.hierarchy, &principal)
        .await?;

    let companies = match visible {
        VisibleCompanies::All => all,
        visible => all.into_iter().filter(|c| visible.contains(c.id)).collect(),
    };
    Ok(Json(companies))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompany,
    responses(
        (status = 200, body = company::Model),
        (status = 409, description = "Company code already exists")
    )
)]
async fn create_company(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageCompanies>,
    client: ClientMeta,
    Json(request): Json<CreateCompany>,
) -> Result<Json<company::Model>> {
    request.validate()?;
    match request.parent_id {
        Some(parent_id) => ensure_company_access(&state, &principal, parent_id).await?,
        None if !state.engine.is_super_admin_like(&principal.role_name) => {
            return Err(AppError::access_denied())
        }
        None => {}
    }

    let created = state.companies.create(request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::CompanyCreated, ResourceType::Company)
                .resource(created.id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({
                    "code": created.code,
                    "parent_id": created.parent_id,
                    "level": created.level,
                })),
        )
        .await;

    Ok(Json(created))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    responses(
        (status = 200, body = company::Model),
        (status = 404, description = "Company not found")
    )
)]
async fn get_company(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<company::Model>> {
    ensure_company_access(&state, &principal, id).await?;
    let company = state.hierarchy.get_by_id(id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    request_body = UpdateCompany,
    responses((status = 200, body = company::Model))
)]
async fn update_company(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageCompanies>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCompany>,
) -> Result<Json<company::Model>> {
    request.validate()?;
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;

    let updated = state.companies.update(id, request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::CompanyUpdated, ResourceType::Company)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(updated))
}

/// Soft delete; the row stays for history
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    responses((status = 200, body = company::Model))
)]
async fn deactivate_company(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageCompanies>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<company::Model>> {
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;

    let updated = state.companies.deactivate(id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::CompanyDeactivated, ResourceType::Company)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(updated))
}

/// Re-parent a company; only superadmins may move to the root
#[utoipa::path(
    post,
    path = "/api/companies/{id}/move",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    request_body = MoveCompany,
    responses(
        (status = 200, body = MoveCompanyResponse),
        (status = 400, description = "Move would create a cycle")
    )
)]
async fn move_company(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageCompanies>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<MoveCompany>,
) -> Result<Json<MoveCompanyResponse>> {
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;
    match request.parent_id {
        Some(parent_id) => ensure_company_access(&state, &principal, parent_id).await?,
        None if !state.engine.is_super_admin_like(&principal.role_name) => {
            return Err(AppError::access_denied())
        }
        None => {}
    }

    let (company, outcome) = state.companies.move_company(id, request.parent_id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::CompanyMoved, ResourceType::Company)
                .resource(id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({
                    "parent_id": request.parent_id,
                    "levels_updated": outcome.updated,
                    "cap_hit": outcome.cap_hit,
                })),
        )
        .await;

    Ok(Json(MoveCompanyResponse {
        company,
        levels_updated: outcome.updated,
    }))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/children",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    responses((status = 200, body = Vec<company::Model>))
)]
async fn get_children(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Vec<company::Model>>> {
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;
    Ok(Json(state.hierarchy.get_children(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/descendants",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    responses((status = 200, body = Vec<company::Model>))
)]
async fn get_descendants(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Vec<company::Model>>> {
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;
    Ok(Json(state.hierarchy.get_descendants(id).await?))
}

/// Ancestors, nearest first
#[utoipa::path(
    get,
    path = "/api/companies/{id}/ancestors",
    tag = "Companies",
    params(("id" = i64, Path, description = "Company id")),
    responses((status = 200, body = Vec<company::Model>))
)]
async fn get_ancestors(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Vec<company::Model>>> {
    ensure_company_access(&state, &principal, id).await?;
    state.hierarchy.get_by_id(id).await?;
    Ok(Json(state.hierarchy.get_ancestors(id).await?))
}
