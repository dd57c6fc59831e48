use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{Authorized, ManageReports, ViewReports};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::financial_report;
use crate::schemas::{CreateReportRequest, UpdateReportRequest};
use crate::services::{AuditEntry, ClientMeta};
use crate::state::AppState;

/// Create financial report routes
pub fn reports_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route(
            "/{id}",
            get(get_report).put(update_report).delete(delete_report),
        )
        .route("/company/{company_id}", get(list_company_reports))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    responses((status = 200, body = Vec<financial_report::Model>))
)]
async fn list_reports(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ViewReports>,
) -> Result<Json<Vec<financial_report::Model>>> {
    Ok(Json(state.reports.list_for_principal(&principal).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/company/{company_id}",
    tag = "Reports",
    params(("company_id" = i64, Path, description = "Company id")),
    responses((status = 200, body = Vec<financial_report::Model>))
)]
async fn list_company_reports(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ViewReports>,
    Path(company_id): Path<i64>,
) -> Result<Json<Vec<financial_report::Model>>> {
    Ok(Json(
        state
            .reports
            .list_by_company(&principal, company_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, body = financial_report::Model),
        (status = 404, description = "Report not found")
    )
)]
async fn get_report(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ViewReports>,
    Path(id): Path<i64>,
) -> Result<Json<financial_report::Model>> {
    Ok(Json(state.reports.get(&principal, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = CreateReportRequest,
    responses(
        (status = 200, body = financial_report::Model),
        (status = 409, description = "Period already reported")
    )
)]
async fn create_report(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageReports>,
    client: ClientMeta,
    Json(request): Json<CreateReportRequest>,
) -> Result<Json<financial_report::Model>> {
    let created = state.reports.create(&principal, request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::ReportCreated, ResourceType::Report)
                .resource(created.id)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({
                    "company_id": created.company_id,
                    "period": created.period,
                })),
        )
        .await;

    Ok(Json(created))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses((status = 200, body = financial_report::Model))
)]
async fn update_report(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageReports>,
    client: ClientMeta,
    Path(id): Path<i64>,
    Json(request): Json<UpdateReportRequest>,
) -> Result<Json<financial_report::Model>> {
    let updated = state.reports.update(&principal, id, request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::ReportUpdated, ResourceType::Report)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    responses((status = 200, description = "Report deleted"))
)]
async fn delete_report(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<ManageReports>,
    client: ClientMeta,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.reports.delete(&principal, id).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::ReportDeleted, ResourceType::Report)
                .resource(id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Report deleted" })))
}
