//! In-app notifications scoped by the authorization engine
//!
//! Superadmin-tier callers see every notification, admin-tier callers see the
//! notifications of users in their company subtree, everyone else sees their own.

mod cache;
pub mod expiry;

pub use cache::{CacheKey, UnreadCountCache};
pub use expiry::{DocumentMetadata, ExpiryScanner, ScanSummary};

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::notification::{self, ExpiryLifecycle, RESOURCE_DOCUMENT};
use crate::models::prelude::*;
use crate::services::authorization::{AccessTier, AuthorizationEngine, Principal, VisibleUsers};
use crate::services::hierarchy::HierarchyService;
use crate::state::DbConn;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Fields for a notification insert
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub resource_type: String,
    pub resource_id: Option<i64>,
    pub lifecycle: Option<ExpiryLifecycle>,
}

/// List filters; `unread_only = Some(false)` selects read notifications only
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct NotificationFilter {
    pub unread_only: Option<bool>,
    /// Keep document notifications whose document expires within this many days
    pub days_until_expiry: Option<i64>,
}

/// Linked document, attached to document notifications in listings
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LinkedDocument {
    pub id: i64,
    pub name: String,
    pub folder_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationItem {
    #[serde(flatten)]
    pub notification: notification::Model,
    pub document: Option<LinkedDocument>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationPage {
    pub items: Vec<NotificationItem>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Clamp page to >= 1 and page size to 1..=100
pub fn normalize_page(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

fn total_pages(total: u64, page_size: u64) -> u64 {
    (total as f64 / page_size as f64).ceil() as u64
}

#[derive(Clone)]
pub struct NotificationService {
    db: DbConn,
    hierarchy: HierarchyService,
    engine: AuthorizationEngine,
    cache: UnreadCountCache,
}

impl NotificationService {
    pub fn new(
        db: DbConn,
        hierarchy: HierarchyService,
        engine: AuthorizationEngine,
        cache: UnreadCountCache,
    ) -> Self {
        Self {
            db,
            hierarchy,
            engine,
            cache,
        }
    }

    pub fn from_config(db: DbConn, hierarchy: HierarchyService, engine: AuthorizationEngine) -> Self {
        let cache = UnreadCountCache::new(CONFIG.notifications.unread_cache_ttl_secs);
        Self::new(db, hierarchy, engine, cache)
    }

    pub fn cache(&self) -> &UnreadCountCache {
        &self.cache
    }

    fn scoped(select: Select<Notification>, visible: &VisibleUsers) -> Select<Notification> {
        match visible {
            VisibleUsers::All => select,
            VisibleUsers::Set(ids) => select.filter(notification::Column::UserId.is_in(ids.clone())),
        }
    }

    async fn invalidate_scope(&self, visible: &VisibleUsers) {
        match visible {
            VisibleUsers::All => self.cache.clear().await,
            VisibleUsers::Set(ids) => {
                for id in ids {
                    self.cache.invalidate_user(*id).await;
                }
            }
        }
    }

    /// Unconditional insert; drops the recipient's cached unread count
    pub async fn create(&self, new: NewNotification) -> Result<notification::Model> {
        let model = notification::ActiveModel {
            user_id: Set(new.user_id),
            notification_type: Set(new.notification_type),
            title: Set(new.title),
            message: Set(new.message),
            resource_type: Set(new.resource_type),
            resource_id: Set(new.resource_id),
            lifecycle: Set(new.lifecycle.map(|l| l.as_str().to_string())),
            is_read: Set(false),
            read_at: Set(None),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.cache.invalidate_user(new.user_id).await;
        self.cache
            .invalidate_roles(self.engine.superadmin_labels())
            .await;
        Ok(model)
    }

    /// Whether `user_id` already holds an unread notification for this resource and lifecycle
    pub async fn has_unread_for(
        &self,
        user_id: i64,
        resource_type: &str,
        resource_id: i64,
        lifecycle: Option<ExpiryLifecycle>,
    ) -> Result<bool> {
        let mut select = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ResourceType.eq(resource_type))
            .filter(notification::Column::ResourceId.eq(resource_id))
            .filter(notification::Column::IsRead.eq(false));
        if let Some(lifecycle) = lifecycle {
            select = select.filter(notification::Column::Lifecycle.eq(lifecycle.as_str()));
        }
        Ok(select.count(&self.db).await? > 0)
    }

    pub async fn list_for_principal(
        &self,
        principal: &Principal,
        filter: &NotificationFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<NotificationPage> {
        let (page, page_size) = normalize_page(page, page_size);
        let visible = self
            .engine
            .resolve_visible_user_ids(&self.hierarchy, principal)
            .await?;

        let mut select = Self::scoped(Notification::find(), &visible);
        if let Some(unread_only) = filter.unread_only {
            select = select.filter(notification::Column::IsRead.eq(!unread_only));
        }
        if filter.days_until_expiry.is_some() {
            select = select.filter(notification::Column::ResourceType.eq(RESOURCE_DOCUMENT));
        }

        let mut total = select.clone().count(&self.db).await?;
        let rows = select
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.db)
            .await?;

        let documents = self.linked_documents(&rows).await?;
        let mut items: Vec<NotificationItem> = rows
            .into_iter()
            .map(|n| {
                let document = n
                    .resource_id
                    .filter(|_| n.resource_type == RESOURCE_DOCUMENT)
                    .and_then(|id| documents.get(&id).cloned());
                NotificationItem {
                    notification: n,
                    document,
                }
            })
            .collect();

        // Applied after paging: the page can hold fewer matches than exist.
        if let Some(max_days) = filter.days_until_expiry {
            let today = chrono::Utc::now().date_naive();
            items.retain(|item| {
                item.document
                    .as_ref()
                    .and_then(|d| d.expiry_date)
                    .map(|date| {
                        let days = expiry::days_until(date, today);
                        (0..=max_days).contains(&days)
                    })
                    .unwrap_or(false)
            });
            total = items.len() as u64;
        }

        Ok(NotificationPage {
            items,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        })
    }

    async fn linked_documents(
        &self,
        rows: &[notification::Model],
    ) -> Result<HashMap<i64, LinkedDocument>> {
        let ids: Vec<i64> = rows
            .iter()
            .filter(|n| n.resource_type == RESOURCE_DOCUMENT)
            .filter_map(|n| n.resource_id)
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let docs = Document::find()
            .filter(crate::models::document::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(docs
            .into_iter()
            .map(|d| {
                let expiry_date = DocumentMetadata::parse(d.metadata.as_deref()).expiry_date();
                (
                    d.id,
                    LinkedDocument {
                        id: d.id,
                        name: d.name,
                        folder_name: d.folder_name,
                        expiry_date,
                    },
                )
            })
            .collect())
    }

    pub async fn unread_count(&self, principal: &Principal) -> Result<u64> {
        let key = UnreadCountCache::key(
            &principal.role_name,
            principal.user_id,
            principal.company_id,
        );
        if let Some(count) = self.cache.get(&key).await {
            return Ok(count);
        }

        let visible = self
            .engine
            .resolve_visible_user_ids(&self.hierarchy, principal)
            .await?;
        let count = Self::scoped(Notification::find(), &visible)
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;

        self.cache.set(key, count).await;
        Ok(count)
    }

    /// Mark one notification read. Already-read rows are left untouched.
    pub async fn mark_read(
        &self,
        principal: &Principal,
        notification_id: i64,
    ) -> Result<notification::Model> {
        let existing = Notification::find_by_id(notification_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if !self
            .engine
            .can_act_on_user(&self.hierarchy, principal, existing.user_id)
            .await?
        {
            return Err(AppError::access_denied());
        }

        let now = chrono::Utc::now();
        Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Some(now)))
            .filter(notification::Column::Id.eq(notification_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        self.cache.invalidate_user(existing.user_id).await;
        self.cache.invalidate_user(principal.user_id).await;
        if self.engine.tier(principal) == AccessTier::SuperAdmin {
            self.cache
                .invalidate_roles(self.engine.superadmin_labels())
                .await;
        }

        Notification::find_by_id(notification_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    /// Mark every unread notification in the caller's scope; returns rows changed
    pub async fn mark_all_read(&self, principal: &Principal) -> Result<u64> {
        let visible = self
            .engine
            .resolve_visible_user_ids(&self.hierarchy, principal)
            .await?;

        let mut update = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Some(chrono::Utc::now())))
            .filter(notification::Column::IsRead.eq(false));
        if let VisibleUsers::Set(ids) = &visible {
            update = update.filter(notification::Column::UserId.is_in(ids.clone()));
        }
        let result = update.exec(&self.db).await?;

        self.invalidate_scope(&visible).await;
        self.cache
            .invalidate_roles(self.engine.superadmin_labels())
            .await;

        tracing::info!(
            user_id = principal.user_id,
            updated = result.rows_affected,
            "Marked notifications as read"
        );
        Ok(result.rows_affected)
    }

    /// Delete every notification in the caller's scope; returns rows removed
    pub async fn delete_all(&self, principal: &Principal) -> Result<u64> {
        let visible = self
            .engine
            .resolve_visible_user_ids(&self.hierarchy, principal)
            .await?;

        let mut delete = Notification::delete_many();
        if let VisibleUsers::Set(ids) = &visible {
            delete = delete.filter(notification::Column::UserId.is_in(ids.clone()));
        }
        let result = delete.exec(&self.db).await?;

        self.invalidate_scope(&visible).await;
        self.cache
            .invalidate_roles(self.engine.superadmin_labels())
            .await;

        tracing::info!(
            user_id = principal.user_id,
            deleted = result.rows_affected,
            "Deleted notifications"
        );
        Ok(result.rows_affected)
    }
}
