//! Scheduled expiry scans
//!
//! Documents carry their expiry date inside free-form JSON metadata; directors
//! carry a term end date column. Both scans are global and deduplicate on
//! unread notifications per resource and lifecycle state.

use chrono::{DateTime, Days, NaiveDate};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use super::{NewNotification, NotificationService};
use crate::error::{AppError, Result};
use crate::models::notification::{
    ExpiryLifecycle, RESOURCE_DIRECTOR, RESOURCE_DOCUMENT, TYPE_DIRECTOR_TERM_EXPIRY,
    TYPE_DOCUMENT_EXPIRY,
};
use crate::models::prelude::*;
use crate::models::{director, document, user};
use crate::state::DbConn;

/// Metadata keys checked for an expiry date, in priority order
const EXPIRY_KEYS: [&str; 2] = ["expired_date", "expiry_date"];

/// Typed view over a document's JSON metadata
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Missing or malformed metadata reads as empty
    pub fn parse(raw: Option<&str>) -> Self {
        let fields = raw
            .and_then(|r| serde_json::from_str::<serde_json::Value>(r).ok())
            .and_then(|v| match v {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        Self { fields }
    }

    /// First non-empty string under a known key, as `YYYY-MM-DD` or RFC 3339
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        let raw = EXPIRY_KEYS.iter().find_map(|key| {
            self.fields
                .get(*key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })?;

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Whole days from `today` to `date`; negative once past
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Last date inside the scan window; rejects negative or unrepresentable thresholds
pub fn scan_cutoff(today: NaiveDate, threshold_days: i64) -> Result<NaiveDate> {
    u64::try_from(threshold_days)
        .ok()
        .and_then(|days| today.checked_add_days(Days::new(days)))
        .ok_or_else(|| {
            AppError::BadRequest(format!("Invalid expiry threshold: {} days", threshold_days))
        })
}

fn describe_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        d if d > 1 => format!("in {} days", d),
        -1 => "1 day ago".to_string(),
        d => format!("{} days ago", -d),
    }
}

pub fn document_title(name: &str, lifecycle: ExpiryLifecycle) -> String {
    match lifecycle {
        ExpiryLifecycle::Approaching => format!("Document '{}' Expiring Soon", name),
        ExpiryLifecycle::Expired => format!("Document '{}' Has Expired", name),
    }
}

fn document_message(doc: &document::Model, expiry: NaiveDate, days: i64) -> String {
    let folder = doc
        .folder_name
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or("No Folder");
    if days >= 0 {
        format!(
            "Document '{}' in folder '{}' expires {} ({}).",
            doc.name,
            folder,
            describe_days(days),
            expiry
        )
    } else {
        format!(
            "Document '{}' in folder '{}' expired {} ({}).",
            doc.name,
            folder,
            describe_days(days),
            expiry
        )
    }
}

pub fn director_title(full_name: &str, lifecycle: ExpiryLifecycle) -> String {
    match lifecycle {
        ExpiryLifecycle::Approaching => format!("Term of '{}' Ending Soon", full_name),
        ExpiryLifecycle::Expired => format!("Term of '{}' Has Ended", full_name),
    }
}

fn director_message(dir: &director::Model, company: &str, end: NaiveDate, days: i64) -> String {
    let verb = if days >= 0 { "ends" } else { "ended" };
    format!(
        "The term of {} ({}) at {} {} {} ({}).",
        dir.full_name,
        dir.position,
        company,
        verb,
        describe_days(days),
        end
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ScanSummary {
    /// Resources inside the threshold window (or already past it)
    pub found: usize,
    pub created: usize,
}

#[derive(Clone)]
pub struct ExpiryScanner {
    db: DbConn,
    notifications: NotificationService,
}

impl ExpiryScanner {
    pub fn new(db: DbConn, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Notify uploaders of documents expiring within `threshold_days` or already expired.
    ///
    /// Only the initial document query can fail the scan; per-document
    /// failures are logged and skipped.
    pub async fn scan_expiring_documents(
        &self,
        threshold_days: i64,
        today: NaiveDate,
    ) -> Result<ScanSummary> {
        scan_cutoff(today, threshold_days)?;
        let documents = Document::find()
            .filter(document::Column::Metadata.is_not_null())
            .order_by_asc(document::Column::Id)
            .all(&self.db)
            .await?;

        let mut summary = ScanSummary::default();

        for doc in documents {
            let Some(expiry) = DocumentMetadata::parse(doc.metadata.as_deref()).expiry_date()
            else {
                continue;
            };
            let days = days_until(expiry, today);
            if days > threshold_days {
                continue;
            }
            summary.found += 1;

            match self.notify_document(&doc, expiry, days).await {
                Ok(true) => summary.created += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(document_id = doc.id, error = %e, "Skipping document in expiry scan");
                }
            }
        }

        tracing::info!(
            found = summary.found,
            created = summary.created,
            threshold_days,
            "Document expiry scan finished"
        );
        Ok(summary)
    }

    async fn notify_document(
        &self,
        doc: &document::Model,
        expiry: NaiveDate,
        days: i64,
    ) -> Result<bool> {
        let lifecycle = ExpiryLifecycle::from_days(days);
        if self
            .notifications
            .has_unread_for(doc.uploader_id, RESOURCE_DOCUMENT, doc.id, Some(lifecycle))
            .await?
        {
            return Ok(false);
        }

        self.notifications
            .create(NewNotification {
                user_id: doc.uploader_id,
                notification_type: TYPE_DOCUMENT_EXPIRY.to_string(),
                title: document_title(&doc.name, lifecycle),
                message: document_message(doc, expiry, days),
                resource_type: RESOURCE_DOCUMENT.to_string(),
                resource_id: Some(doc.id),
                lifecycle: Some(lifecycle),
            })
            .await?;
        Ok(true)
    }

    /// Notify every user of the director's company about terms ending within
    /// `threshold_days` or already ended.
    pub async fn scan_expiring_director_terms(
        &self,
        threshold_days: i64,
        today: NaiveDate,
    ) -> Result<ScanSummary> {
        let cutoff = scan_cutoff(today, threshold_days)?;
        let directors = Director::find()
            .filter(director::Column::EndDate.is_not_null())
            .filter(director::Column::EndDate.lte(cutoff))
            .order_by_asc(director::Column::Id)
            .all(&self.db)
            .await?;

        let mut summary = ScanSummary::default();

        for dir in directors {
            let Some(end) = dir.end_date else {
                continue;
            };
            summary.found += 1;

            match self.notify_director(&dir, end, days_until(end, today)).await {
                Ok(created) => summary.created += created,
                Err(e) => {
                    tracing::warn!(director_id = dir.id, error = %e, "Skipping director in term scan");
                }
            }
        }

        tracing::info!(
            found = summary.found,
            created = summary.created,
            threshold_days,
            "Director term scan finished"
        );
        Ok(summary)
    }

    async fn notify_director(&self, dir: &director::Model, end: NaiveDate, days: i64) -> Result<usize> {
        let lifecycle = ExpiryLifecycle::from_days(days);
        let company_name = Company::find_by_id(dir.company_id)
            .one(&self.db)
            .await?
            .map(|c| c.name)
            .unwrap_or_else(|| dir.company_id.to_string());

        let recipients = User::find()
            .filter(user::Column::CompanyId.eq(dir.company_id))
            .all(&self.db)
            .await?;

        let mut created = 0;
        for recipient in recipients {
            if self
                .notifications
                .has_unread_for(recipient.id, RESOURCE_DIRECTOR, dir.id, Some(lifecycle))
                .await?
            {
                continue;
            }
            self.notifications
                .create(NewNotification {
                    user_id: recipient.id,
                    notification_type: TYPE_DIRECTOR_TERM_EXPIRY.to_string(),
                    title: director_title(&dir.full_name, lifecycle),
                    message: director_message(dir, &company_name, end, days),
                    resource_type: RESOURCE_DIRECTOR.to_string(),
                    resource_id: Some(dir.id),
                    lifecycle: Some(lifecycle),
                })
                .await?;
            created += 1;
        }
        Ok(created)
    }
}
