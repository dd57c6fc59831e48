use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::SuperAdmin;
use crate::services::audit::{get_audit_logs, AuditLogQuery, AuditLogResponse};
use crate::state::AppState;

/// Create audit routes
pub fn audit_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_audit_logs))
        .with_state(state)
}

/// List audit logs with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Audit",
    params(AuditLogQuery),
    responses(
        (status = 200, body = AuditLogResponse),
        (status = 403, description = "Superadmin only")
    )
)]
async fn list_audit_logs(
    State(state): State<AppState>,
    _auth: SuperAdmin,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogResponse>> {
    let logs = get_audit_logs(&state.db, query).await?;
    Ok(Json(logs))
}
