//! Expiry scanner tests
//!
//! Covers:
//! - documents inside the threshold (and already expired) are notified
//! - documents beyond the threshold or without an expiry date are ignored
//! - repeated scans do not duplicate unread notifications
//! - an approaching and an expired notification may coexist
//! - director terms notify every user of the company
//! - the scheduled scan tasks notify and audit on their own

use chrono::Duration;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

mod common;
use common::{
    create_company, create_director, create_document, create_test_db, create_test_user,
    test_notifications, today,
};

use dms_backend::models::notification::{self, RESOURCE_DIRECTOR, RESOURCE_DOCUMENT};
use dms_backend::models::prelude::*;
use dms_backend::models::audit_log;
use dms_backend::services::notification::ExpiryScanner;
use dms_backend::services::scheduler::{DocumentExpiryScanTask, PeriodicTask};
use dms_backend::services::AuditService;

async fn notifications_for(db: &sea_orm::DatabaseConnection, user_id: i64) -> Vec<notification::Model> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_document_scan_window() {
    let db = create_test_db().await;
    let owner = create_test_user(&db, "owner", "staff", None).await;

    create_document(&db, "Lease", None, owner.id, Some(today() + Duration::days(5))).await;
    create_document(&db, "Permit", None, owner.id, Some(today() - Duration::days(1))).await;
    create_document(&db, "Insurance", None, owner.id, Some(today() + Duration::days(60))).await;
    create_document(&db, "Memo", None, owner.id, None).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    let summary = scanner.scan_expiring_documents(14, today()).await.unwrap();
    assert_eq!(summary.found, 2);
    assert_eq!(summary.created, 2);

    let mut titles: Vec<String> = notifications_for(&db, owner.id)
        .await
        .into_iter()
        .map(|n| n.title)
        .collect();
    titles.sort();
    assert_eq!(
        titles,
        vec![
            "Document 'Lease' Expiring Soon".to_string(),
            "Document 'Permit' Has Expired".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_document_scan_is_deduplicated() {
    let db = create_test_db().await;
    let owner = create_test_user(&db, "owner", "staff", None).await;
    create_document(&db, "Lease", None, owner.id, Some(today() + Duration::days(2))).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    assert_eq!(scanner.scan_expiring_documents(14, today()).await.unwrap().created, 1);

    let second = scanner.scan_expiring_documents(14, today()).await.unwrap();
    assert_eq!(second.found, 1);
    assert_eq!(second.created, 0);
    assert_eq!(notifications_for(&db, owner.id).await.len(), 1);

    // Once read, the next scan notifies again
    let existing = notifications_for(&db, owner.id).await.remove(0);
    let mut read: notification::ActiveModel = existing.into();
    read.is_read = Set(true);
    read.update(&db).await.unwrap();

    assert_eq!(scanner.scan_expiring_documents(14, today()).await.unwrap().created, 1);
}

#[tokio::test]
async fn test_approaching_and_expired_coexist() {
    let db = create_test_db().await;
    let owner = create_test_user(&db, "owner", "staff", None).await;
    let expires = today() + Duration::days(1);
    create_document(&db, "Lease", None, owner.id, Some(expires)).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    scanner.scan_expiring_documents(14, today()).await.unwrap();

    // Two days later the same document has expired
    let later = today() + Duration::days(2);
    let summary = scanner.scan_expiring_documents(14, later).await.unwrap();
    assert_eq!(summary.created, 1);

    let mut lifecycles: Vec<Option<String>> = notifications_for(&db, owner.id)
        .await
        .into_iter()
        .map(|n| n.lifecycle)
        .collect();
    lifecycles.sort();
    assert_eq!(
        lifecycles,
        vec![Some("approaching".to_string()), Some("expired".to_string())]
    );
}

#[tokio::test]
async fn test_document_expiring_today_is_approaching() {
    let db = create_test_db().await;
    let owner = create_test_user(&db, "owner", "staff", None).await;
    create_document(&db, "Visa", None, owner.id, Some(today())).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    scanner.scan_expiring_documents(0, today()).await.unwrap();

    let notes = notifications_for(&db, owner.id).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].resource_type, RESOURCE_DOCUMENT);
    assert_eq!(notes[0].lifecycle.as_deref(), Some("approaching"));
    assert!(notes[0].message.contains("today"));
}

#[tokio::test]
async fn test_director_scan_notifies_company_users() {
    let db = create_test_db().await;
    let a = create_company(&db, "A", None).await;
    let b = create_company(&db, "B", None).await;
    let u1 = create_test_user(&db, "u1", "staff", Some(a.id)).await;
    let u2 = create_test_user(&db, "u2", "manager", Some(a.id)).await;
    let outsider = create_test_user(&db, "outsider", "staff", Some(b.id)).await;

    create_director(&db, a.id, "Jane Roe", Some(today() + Duration::days(10))).await;
    create_director(&db, a.id, "Open Ended", None).await;
    create_director(&db, a.id, "Far Away", Some(today() + Duration::days(200))).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    let summary = scanner
        .scan_expiring_director_terms(30, today())
        .await
        .unwrap();
    assert_eq!(summary.found, 1);
    assert_eq!(summary.created, 2);

    for user in [&u1, &u2] {
        let notes = notifications_for(&db, user.id).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].resource_type, RESOURCE_DIRECTOR);
        assert_eq!(notes[0].title, "Term of 'Jane Roe' Ending Soon");
    }
    assert!(notifications_for(&db, outsider.id).await.is_empty());

    let again = scanner
        .scan_expiring_director_terms(30, today())
        .await
        .unwrap();
    assert_eq!(again.created, 0);
}

#[tokio::test]
async fn test_ended_director_term() {
    let db = create_test_db().await;
    let a = create_company(&db, "A", None).await;
    let u1 = create_test_user(&db, "u1", "staff", Some(a.id)).await;
    create_director(&db, a.id, "Former", Some(today() - Duration::days(3))).await;

    let scanner = ExpiryScanner::new(db.clone(), test_notifications(&db));
    scanner
        .scan_expiring_director_terms(7, today())
        .await
        .unwrap();

    let notes = notifications_for(&db, u1.id).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Term of 'Former' Has Ended");
}

#[tokio::test]
async fn test_scheduled_document_task() {
    let db = create_test_db().await;
    let owner = create_test_user(&db, "owner", "staff", None).await;
    create_document(&db, "Lease", None, owner.id, Some(today() + Duration::days(3))).await;

    let audit = AuditService::new();
    audit.set_db(db.clone()).await;
    let task = DocumentExpiryScanTask {
        scanner: ExpiryScanner::new(db.clone(), test_notifications(&db)),
        audit,
        threshold_days: 14,
        every: std::time::Duration::from_secs(60),
    };
    assert_eq!(task.name(), "document_expiry_scan");

    task.run().await.unwrap();
    assert_eq!(notifications_for(&db, owner.id).await.len(), 1);

    // A second pass finds only duplicates and writes no audit row
    task.run().await.unwrap();
    let scans = AuditLog::find()
        .filter(audit_log::Column::Action.eq("expiry_scan"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].resource_id.as_deref(), Some("documents"));
}
