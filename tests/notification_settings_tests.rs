//! Notification settings tests

mod common;
use common::{create_test_db, create_test_user};

use dms_backend::error::AppError;
use dms_backend::schemas::UpdateSettingsRequest;
use dms_backend::services::notification_settings::{get_settings, update_settings};

#[tokio::test]
async fn test_defaults_created_on_first_read() {
    let db = create_test_db().await;
    let user = create_test_user(&db, "hana", "staff", None).await;

    let settings = get_settings(&db, user.id).await.unwrap();
    assert!(settings.email_enabled);
    assert!(settings.in_app_enabled);
    assert_eq!(settings.expiry_threshold_days, 14);

    // Second read returns the same row
    let again = get_settings(&db, user.id).await.unwrap();
    assert_eq!(again.id, settings.id);
}

#[tokio::test]
async fn test_partial_update() {
    let db = create_test_db().await;
    let user = create_test_user(&db, "ivan", "staff", None).await;

    let updated = update_settings(
        &db,
        user.id,
        UpdateSettingsRequest {
            email_enabled: Some(false),
            expiry_threshold_days: Some(30),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!updated.email_enabled);
    assert!(updated.in_app_enabled);
    assert_eq!(updated.expiry_threshold_days, 30);
}

#[tokio::test]
async fn test_threshold_out_of_range() {
    let db = create_test_db().await;
    let user = create_test_user(&db, "jo", "staff", None).await;

    for days in [0, 366, -5] {
        let err = update_settings(
            &db,
            user.id,
            UpdateSettingsRequest {
                expiry_threshold_days: Some(days),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "days = {}", days);
    }

    let unchanged = get_settings(&db, user.id).await.unwrap();
    assert_eq!(unchanged.expiry_threshold_days, 14);
}
