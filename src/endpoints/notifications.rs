use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use validator::Validate;

use crate::config::CONFIG;
use crate::error::Result;
use crate::middleware::{Authenticated, SuperAdmin};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::{notification, notification_settings};
use crate::schemas::{
    AffectedResponse, CheckExpiryRequest, CheckExpiryResponse, NotificationListQuery,
    UnreadCountResponse, UpdateSettingsRequest,
};
use crate::services::notification::{NotificationFilter, NotificationPage};
use crate::services::notification_settings::{get_settings, update_settings};
use crate::services::{AuditEntry, ClientMeta};
use crate::state::AppState;

/// Create notification routes
pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_notifications).delete(delete_all))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
        .route("/check-expiry", post(check_expiry))
        .route("/settings", get(get_my_settings).put(update_my_settings))
        .with_state(state)
}

/// Notifications in the caller's scope, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationListQuery),
    responses((status = 200, body = NotificationPage))
)]
async fn list_notifications(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationPage>> {
    let filter = NotificationFilter {
        unread_only: query.unread_only,
        days_until_expiry: query.days_until_expiry,
    };
    let page = state
        .notifications
        .list_for_principal(&principal, &filter, query.page, query.page_size)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    responses((status = 200, body = UnreadCountResponse))
)]
async fn unread_count(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<UnreadCountResponse>> {
    let unread_count = state.notifications.unread_count(&principal).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, body = notification::Model),
        (status = 403, description = "Notification outside the caller's scope"),
        (status = 404, description = "Notification not found")
    )
)]
async fn mark_read(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<notification::Model>> {
    Ok(Json(state.notifications.mark_read(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, body = AffectedResponse))
)]
async fn mark_all_read(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<AffectedResponse>> {
    let affected = state.notifications.mark_all_read(&principal).await?;
    Ok(Json(AffectedResponse { affected }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 200, body = AffectedResponse))
)]
async fn delete_all(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<AffectedResponse>> {
    let affected = state.notifications.delete_all(&principal).await?;
    Ok(Json(AffectedResponse { affected }))
}

/// Run both expiry scans now
#[utoipa::path(
    post,
    path = "/api/notifications/check-expiry",
    tag = "Notifications",
    request_body = CheckExpiryRequest,
    responses(
        (status = 200, body = CheckExpiryResponse),
        (status = 403, description = "Superadmin only")
    )
)]
async fn check_expiry(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    client: ClientMeta,
    body: Option<Json<CheckExpiryRequest>>,
) -> Result<Json<CheckExpiryResponse>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    request.validate()?;
    let threshold_days = request
        .threshold_days
        .unwrap_or(CONFIG.notifications.expiry_threshold_days);
    let today = chrono::Utc::now().date_naive();

    let documents = state
        .scanner
        .scan_expiring_documents(threshold_days, today)
        .await?;
    let directors = state
        .scanner
        .scan_expiring_director_terms(threshold_days, today)
        .await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::ExpiryScan, ResourceType::Notification)
                .by(&principal)
                .client(&client)
                .details(serde_json::json!({
                    "threshold_days": threshold_days,
                    "documents_found": documents.found,
                    "directors_found": directors.found,
                    "created": documents.created + directors.created,
                })),
        )
        .await;

    Ok(Json(CheckExpiryResponse {
        documents_found: documents.found,
        document_notifications_created: documents.created,
        directors_found: directors.found,
        director_notifications_created: directors.created,
        threshold_days,
    }))
}

#[utoipa::path(
    get,
    path = "/api/notifications/settings",
    tag = "Notifications",
    responses((status = 200, body = notification_settings::Model))
)]
async fn get_my_settings(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<notification_settings::Model>> {
    Ok(Json(get_settings(&state.db, principal.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/notifications/settings",
    tag = "Notifications",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, body = notification_settings::Model),
        (status = 400, description = "Threshold outside 1..=365")
    )
)]
async fn update_my_settings(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    client: ClientMeta,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<notification_settings::Model>> {
    let updated = update_settings(&state.db, principal.user_id, request).await?;

    state
        .audit
        .record(
            AuditEntry::new(AuditAction::SettingsUpdated, ResourceType::User)
                .resource(principal.user_id)
                .by(&principal)
                .client(&client),
        )
        .await;

    Ok(Json(updated))
}
