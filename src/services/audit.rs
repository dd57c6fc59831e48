use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::audit_log::{self, AuditAction, ResourceType};
use crate::services::authorization::Principal;
use crate::state::DbConn;

/// Where a request came from; extracted per request in the HTTP layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One audit record before it is written
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, resource_type: ResourceType) -> Self {
        Self {
            action,
            resource_type,
            resource_id: None,
            user_id: None,
            username: None,
            details: None,
            ip_address: None,
            user_agent: None,
            success: true,
            error_message: None,
        }
    }

    pub fn resource(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn actor(mut self, user_id: Option<i64>, username: Option<String>) -> Self {
        self.user_id = user_id;
        self.username = username;
        self
    }

    pub fn by(self, principal: &Principal) -> Self {
        self.actor(Some(principal.user_id), Some(principal.username.clone()))
    }

    pub fn client(mut self, client: &ClientMeta) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error.into());
        self
    }
}

/// Audit service for logging system events
#[derive(Clone, Default)]
pub struct AuditService {
    db: Arc<RwLock<Option<DbConn>>>,
}

impl AuditService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_db(&self, db: DbConn) {
        *self.db.write().await = Some(db);
    }

    /// Write an audit event
    pub async fn log(&self, entry: AuditEntry) -> Result<()> {
        let db_guard = self.db.read().await;
        let db = match db_guard.as_ref() {
            Some(db) => db,
            None => {
                tracing::warn!("Audit service: database not initialized, skipping log");
                return Ok(());
            }
        };

        let log_entry = audit_log::ActiveModel {
            timestamp: Set(chrono::Utc::now()),
            user_id: Set(entry.user_id),
            username: Set(entry.username),
            action: Set(entry.action.to_string()),
            resource_type: Set(entry.resource_type.to_string()),
            resource_id: Set(entry.resource_id),
            details: Set(entry.details.map(|d| d.to_string())),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            success: Set(entry.success),
            error_message: Set(entry.error_message),
            ..Default::default()
        };

        log_entry.insert(db).await?;
        Ok(())
    }

    /// Write an audit event; a failed write is logged and never reaches the caller
    pub async fn record(&self, entry: AuditEntry) {
        let action = entry.action;
        if let Err(e) = self.log(entry).await {
            tracing::warn!(action = %action, error = %e, "Failed to write audit log");
        }
    }
}

/// Query parameters for fetching audit logs
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub success: Option<bool>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub search: Option<String>,
}

/// Paginated audit log response
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuditLogResponse {
    pub logs: Vec<audit_log::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Get audit logs with filtering and pagination
pub async fn get_audit_logs(db: &DbConn, query: AuditLogQuery) -> Result<AuditLogResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut select = audit_log::Entity::find();

    if let Some(user_id) = query.user_id {
        select = select.filter(audit_log::Column::UserId.eq(user_id));
    }
    if let Some(action) = &query.action {
        select = select.filter(audit_log::Column::Action.eq(action.clone()));
    }
    if let Some(resource_type) = &query.resource_type {
        select = select.filter(audit_log::Column::ResourceType.eq(resource_type.clone()));
    }
    if let Some(success) = query.success {
        select = select.filter(audit_log::Column::Success.eq(success));
    }
    if let Some(from) = query.from {
        select = select.filter(audit_log::Column::Timestamp.gte(from));
    }
    if let Some(to) = query.to {
        select = select.filter(audit_log::Column::Timestamp.lte(to));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(
            audit_log::Column::Username
                .contains(search)
                .or(audit_log::Column::Action.contains(search))
                .or(audit_log::Column::ResourceId.contains(search))
                .or(audit_log::Column::Details.contains(search)),
        );
    }

    let total = select.clone().count(db).await?;

    let logs = select
        .order_by_desc(audit_log::Column::Timestamp)
        .order_by_desc(audit_log::Column::Id)
        .offset(offset)
        .limit(per_page)
        .all(db)
        .await?;

    let total_pages = (total as f64 / per_page as f64).ceil() as u64;

    Ok(AuditLogResponse {
        logs,
        total,
        page,
        per_page,
        total_pages,
    })
}
