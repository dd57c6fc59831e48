//! Test helpers and utilities for integration testing.
//!
//! Every test gets its own in-memory SQLite database with the full schema and
//! the default roles and permissions already seeded by the migrations.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;

use dms_backend::middleware::LoginRateLimiter;
use dms_backend::migrations::Migrator;
use dms_backend::models::prelude::*;
use dms_backend::models::{company, director, document, role, user};
use dms_backend::services::notification::UnreadCountCache;
use dms_backend::services::security::hash_password;
use dms_backend::services::{
    AuthorizationEngine, ClaimsIssuer, HierarchyService, NotificationService, Principal,
    SecretCipher, TwoFactorService,
};
use dms_backend::state::{AppState, DbConn, StateParts};

pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests";
pub const TEST_ISSUER: &str = "dms-test";
pub const TEST_PASSWORD: &str = "correct horse battery";
/// Login attempts per client per minute in test app states
pub const TEST_LOGIN_ATTEMPTS: usize = 5;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DbConn {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn test_engine() -> AuthorizationEngine {
    AuthorizationEngine::new(["superadmin", "administrator"])
}

pub fn test_hierarchy(db: &DbConn) -> HierarchyService {
    HierarchyService::new(db.clone(), 10, 1000)
}

pub fn test_cipher() -> SecretCipher {
    SecretCipher::from_passphrase("integration-test-key")
}

pub fn test_claims(db: &DbConn) -> ClaimsIssuer {
    ClaimsIssuer::new(
        db.clone(),
        test_engine(),
        TEST_JWT_SECRET,
        TEST_ISSUER,
        Duration::hours(1),
    )
}

pub fn test_notifications(db: &DbConn) -> NotificationService {
    NotificationService::new(
        db.clone(),
        test_hierarchy(db),
        test_engine(),
        UnreadCountCache::new(60),
    )
}

/// Full application state wired with test keys, independent of env config
pub async fn build_test_app_state(db: DbConn) -> AppState {
    let parts = StateParts {
        engine: test_engine(),
        hierarchy: test_hierarchy(&db),
        claims: test_claims(&db),
        two_factor: TwoFactorService::new(db.clone(), test_cipher(), "DMS Test"),
        notifications: test_notifications(&db),
        login_limiter: LoginRateLimiter::new(
            TEST_LOGIN_ATTEMPTS,
            std::time::Duration::from_secs(60),
        ),
    };
    AppState::assemble(db, parts).await
}

/// Insert a company; the level follows the parent the way the service computes it
pub async fn create_company(
    db: &DbConn,
    code: &str,
    parent: Option<&company::Model>,
) -> company::Model {
    let now = chrono::Utc::now();
    company::ActiveModel {
        name: Set(format!("{} Ltd", code)),
        code: Set(code.to_string()),
        description: Set(None),
        parent_id: Set(parent.map(|p| p.id)),
        level: Set(parent.map(|p| p.level + 1).unwrap_or(0)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create company")
}

/// Insert a user bound to a seeded role (looked up by name, if present)
pub async fn create_test_user(
    db: &DbConn,
    username: &str,
    role_name: &str,
    company_id: Option<i64>,
) -> user::Model {
    let role_id = Role::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await
        .expect("Failed to query roles")
        .map(|r| r.id);

    let now = chrono::Utc::now();
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        hashed_password: Set(hash_password(TEST_PASSWORD).expect("Failed to hash password")),
        role: Set(role_name.to_string()),
        role_id: Set(role_id),
        company_id: Set(company_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn principal_for(db: &DbConn, user: &user::Model) -> Principal {
    test_claims(db)
        .resolve_principal(user.id)
        .await
        .expect("Failed to resolve principal")
}

pub async fn bearer_token(state: &AppState, user: &user::Model) -> String {
    let issued = state.claims.issue(user.id).await.expect("Failed to issue token");
    format!("Bearer {}", issued.token)
}

/// Insert a document whose metadata carries `expired_date`
pub async fn create_document(
    db: &DbConn,
    name: &str,
    company_id: Option<i64>,
    uploader_id: i64,
    expires: Option<NaiveDate>,
) -> document::Model {
    let metadata = expires.map(|d| {
        serde_json::json!({ "expired_date": d.format("%Y-%m-%d").to_string() }).to_string()
    });
    let now = chrono::Utc::now();
    document::ActiveModel {
        name: Set(name.to_string()),
        company_id: Set(company_id),
        uploader_id: Set(uploader_id),
        folder_name: Set(Some("Contracts".to_string())),
        file_path: Set(None),
        metadata: Set(metadata),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create document")
}

pub async fn create_director(
    db: &DbConn,
    company_id: i64,
    full_name: &str,
    end_date: Option<NaiveDate>,
) -> director::Model {
    director::ActiveModel {
        company_id: Set(company_id),
        full_name: Set(full_name.to_string()),
        position: Set("Director".to_string()),
        start_date: Set(None),
        end_date: Set(end_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create director")
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
