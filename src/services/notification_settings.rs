use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use validator::Validate;

use crate::error::Result;
use crate::models::notification_settings;
use crate::models::prelude::*;
use crate::schemas::UpdateSettingsRequest;
use crate::state::DbConn;

pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i32 = 14;

/// Settings row for a user, created with defaults on first read
pub async fn get_settings(db: &DbConn, user_id: i64) -> Result<notification_settings::Model> {
    if let Some(existing) = NotificationSettings::find()
        .filter(notification_settings::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let now = chrono::Utc::now();
    let created = notification_settings::ActiveModel {
        user_id: Set(user_id),
        email_enabled: Set(true),
        in_app_enabled: Set(true),
        expiry_threshold_days: Set(DEFAULT_EXPIRY_THRESHOLD_DAYS),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::debug!(user_id, "Created default notification settings");
    Ok(created)
}

/// Apply a partial update; the threshold must lie in `1..=365`
pub async fn update_settings(
    db: &DbConn,
    user_id: i64,
    request: UpdateSettingsRequest,
) -> Result<notification_settings::Model> {
    request.validate()?;

    let current = get_settings(db, user_id).await?;
    let mut active: notification_settings::ActiveModel = current.into();

    if let Some(email_enabled) = request.email_enabled {
        active.email_enabled = Set(email_enabled);
    }
    if let Some(in_app_enabled) = request.in_app_enabled {
        active.in_app_enabled = Set(in_app_enabled);
    }
    if let Some(days) = request.expiry_threshold_days {
        active.expiry_threshold_days = Set(days);
    }
    active.updated_at = Set(chrono::Utc::now());

    Ok(active.update(db).await?)
}
