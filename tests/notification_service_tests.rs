//! Notification service tests
//!
//! Covers:
//! - listing is scoped by tier (superadmin / admin subtree / self)
//! - pagination and the read / unread filter
//! - cached unread counts are invalidated by writes
//! - mark-read is idempotent and refuses rows outside the caller's scope
//! - mark-all-read and delete-all stay inside the caller's scope
//! - the days-until-expiry filter keeps only soon-to-expire documents

use chrono::Duration;

mod common;
use common::{
    create_company, create_document, create_test_db, create_test_user, principal_for,
    test_notifications, today,
};

use dms_backend::error::AppError;
use dms_backend::models::notification::{ExpiryLifecycle, RESOURCE_DOCUMENT, TYPE_DOCUMENT_EXPIRY};
use dms_backend::services::notification::{NewNotification, NotificationFilter, NotificationService};

fn note(user_id: i64, title: &str) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: "info".to_string(),
        title: title.to_string(),
        message: format!("{} body", title),
        resource_type: "system".to_string(),
        resource_id: None,
        lifecycle: None,
    }
}

async fn seed(service: &NotificationService, user_id: i64, count: usize) {
    for i in 0..count {
        service
            .create(note(user_id, &format!("note {}", i)))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_listing_is_scoped_by_tier() {
    let db = create_test_db().await;
    let root = create_company(&db, "ROOT", None).await;
    let a = create_company(&db, "A", Some(&root)).await;
    let b = create_company(&db, "B", Some(&root)).await;

    let sa = create_test_user(&db, "sa", "superadmin", None).await;
    let admin_a = create_test_user(&db, "admin-a", "admin", Some(a.id)).await;
    let staff_a = create_test_user(&db, "staff-a", "staff", Some(a.id)).await;
    let staff_b = create_test_user(&db, "staff-b", "staff", Some(b.id)).await;

    let service = test_notifications(&db);
    seed(&service, staff_a.id, 2).await;
    seed(&service, staff_b.id, 3).await;
    seed(&service, admin_a.id, 1).await;

    let filter = NotificationFilter::default();

    let page = service
        .list_for_principal(&principal_for(&db, &sa).await, &filter, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 6);

    let page = service
        .list_for_principal(&principal_for(&db, &admin_a).await, &filter, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert!(page
        .items
        .iter()
        .all(|i| i.notification.user_id != staff_b.id));

    let page = service
        .list_for_principal(&principal_for(&db, &staff_b).await, &filter, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert!(page
        .items
        .iter()
        .all(|i| i.notification.user_id == staff_b.id));
}

#[tokio::test]
async fn test_pagination_and_read_filter() {
    let db = create_test_db().await;
    let staff = create_test_user(&db, "staff", "staff", None).await;
    let principal = principal_for(&db, &staff).await;

    let service = test_notifications(&db);
    seed(&service, staff.id, 5).await;

    let page = service
        .list_for_principal(&principal, &NotificationFilter::default(), Some(2), Some(2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 2);

    let first = service
        .list_for_principal(&principal, &NotificationFilter::default(), None, Some(1))
        .await
        .unwrap();
    service
        .mark_read(&principal, first.items[0].notification.id)
        .await
        .unwrap();

    let unread = NotificationFilter {
        unread_only: Some(true),
        ..Default::default()
    };
    let read = NotificationFilter {
        unread_only: Some(false),
        ..Default::default()
    };
    let unread_page = service
        .list_for_principal(&principal, &unread, None, None)
        .await
        .unwrap();
    let read_page = service
        .list_for_principal(&principal, &read, None, None)
        .await
        .unwrap();
    assert_eq!(unread_page.total, 4);
    assert_eq!(read_page.total, 1);
    assert!(read_page.items[0].notification.is_read);
}

#[tokio::test]
async fn test_unread_count_cache_is_invalidated() {
    let db = create_test_db().await;
    let staff = create_test_user(&db, "staff", "staff", None).await;
    let principal = principal_for(&db, &staff).await;

    let service = test_notifications(&db);
    assert_eq!(service.unread_count(&principal).await.unwrap(), 0);
    assert_eq!(service.cache().len().await, 1);

    let created = service.create(note(staff.id, "hello")).await.unwrap();
    assert_eq!(service.unread_count(&principal).await.unwrap(), 1);

    service.mark_read(&principal, created.id).await.unwrap();
    assert_eq!(service.unread_count(&principal).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unread_count_refreshes_for_role_names_with_colons() {
    let db = create_test_db().await;
    let a = create_company(&db, "A", None).await;
    let lead = create_test_user(&db, "lead", "ops:lead", Some(a.id)).await;
    let principal = principal_for(&db, &lead).await;
    assert_eq!(principal.role_name, "ops:lead");

    let service = test_notifications(&db);
    assert_eq!(service.unread_count(&principal).await.unwrap(), 0);

    service.create(note(lead.id, "hello")).await.unwrap();
    assert_eq!(service.unread_count(&principal).await.unwrap(), 1);
}

#[tokio::test]
async fn test_superadmin_count_refreshes_after_user_marks_read() {
    let db = create_test_db().await;
    let sa = create_test_user(&db, "sa", "superadmin", None).await;
    let staff = create_test_user(&db, "staff", "staff", None).await;
    let sa_principal = principal_for(&db, &sa).await;
    let staff_principal = principal_for(&db, &staff).await;

    let service = test_notifications(&db);
    let created = service.create(note(staff.id, "hello")).await.unwrap();
    assert_eq!(service.unread_count(&sa_principal).await.unwrap(), 1);

    service.mark_all_read(&staff_principal).await.unwrap();
    assert_eq!(service.unread_count(&sa_principal).await.unwrap(), 0);

    // Idempotent: already read stays read, and still resolves
    let again = service.mark_read(&staff_principal, created.id).await.unwrap();
    assert!(again.is_read);
}

#[tokio::test]
async fn test_mark_read_outside_scope() {
    let db = create_test_db().await;
    let a = create_company(&db, "A", None).await;
    let b = create_company(&db, "B", None).await;
    let admin_a = create_test_user(&db, "admin-a", "admin", Some(a.id)).await;
    let staff_a = create_test_user(&db, "staff-a", "staff", Some(a.id)).await;
    let staff_b = create_test_user(&db, "staff-b", "staff", Some(b.id)).await;

    let service = test_notifications(&db);
    let for_a = service.create(note(staff_a.id, "a")).await.unwrap();
    let for_b = service.create(note(staff_b.id, "b")).await.unwrap();

    let admin = principal_for(&db, &admin_a).await;
    let err = service.mark_read(&admin, for_b.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let marked = service.mark_read(&admin, for_a.id).await.unwrap();
    assert!(marked.is_read);
    assert!(marked.read_at.is_some());

    let staff = principal_for(&db, &staff_b).await;
    let err = service.mark_read(&staff, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_bulk_operations_stay_in_scope() {
    let db = create_test_db().await;
    let a = create_company(&db, "A", None).await;
    let b = create_company(&db, "B", None).await;
    let admin_a = create_test_user(&db, "admin-a", "admin", Some(a.id)).await;
    let staff_a = create_test_user(&db, "staff-a", "staff", Some(a.id)).await;
    let staff_b = create_test_user(&db, "staff-b", "staff", Some(b.id)).await;

    let service = test_notifications(&db);
    seed(&service, staff_a.id, 2).await;
    seed(&service, staff_b.id, 2).await;

    let admin = principal_for(&db, &admin_a).await;
    assert_eq!(service.mark_all_read(&admin).await.unwrap(), 2);
    assert_eq!(
        service
            .unread_count(&principal_for(&db, &staff_b).await)
            .await
            .unwrap(),
        2
    );

    assert_eq!(service.delete_all(&admin).await.unwrap(), 2);
    let remaining = service
        .list_for_principal(
            &principal_for(&db, &staff_b).await,
            &NotificationFilter::default(),
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(remaining.total, 2);
}

#[tokio::test]
async fn test_days_until_expiry_filter() {
    let db = create_test_db().await;
    let staff = create_test_user(&db, "staff", "staff", None).await;
    let principal = principal_for(&db, &staff).await;
    let service = test_notifications(&db);

    let soon = create_document(&db, "Soon", None, staff.id, Some(today() + Duration::days(3))).await;
    let later = create_document(&db, "Later", None, staff.id, Some(today() + Duration::days(30))).await;
    let past = create_document(&db, "Past", None, staff.id, Some(today() - Duration::days(2))).await;

    for doc in [&soon, &later, &past] {
        service
            .create(NewNotification {
                user_id: staff.id,
                notification_type: TYPE_DOCUMENT_EXPIRY.to_string(),
                title: doc.name.clone(),
                message: String::new(),
                resource_type: RESOURCE_DOCUMENT.to_string(),
                resource_id: Some(doc.id),
                lifecycle: Some(ExpiryLifecycle::Approaching),
            })
            .await
            .unwrap();
    }
    service.create(note(staff.id, "unrelated")).await.unwrap();

    let filter = NotificationFilter {
        days_until_expiry: Some(7),
        ..Default::default()
    };
    let page = service
        .list_for_principal(&principal, &filter, None, None)
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    let item = &page.items[0];
    assert_eq!(item.notification.resource_id, Some(soon.id));
    let linked = item.document.as_ref().unwrap();
    assert_eq!(linked.name, "Soon");
    assert_eq!(linked.folder_name.as_deref(), Some("Contracts"));
}
