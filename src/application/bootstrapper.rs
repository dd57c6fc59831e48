//! Application bootstrapper
//!
//! Handles all initialization and setup for the DMS backend.

use std::net::SocketAddr;

use axum::{middleware as axum_middleware, Router};
use http::{HeaderValue, Method};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::middleware::security_headers;
use crate::models::prelude::*;
use crate::models::{role, user};
use crate::services::scheduler;
use crate::services::security::hash_password;
use crate::state::{AppState, DbConn};

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        version = %CONFIG.version,
        commit = %CONFIG.commit_hash,
        "Starting DMS backend"
    );
    if CONFIG.auth.uses_dev_secret() {
        tracing::warn!("DMS_JWT_SECRET is not set; using the development secret");
    }

    let state = init_services().await?;

    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("dms_backend={},tower_http=info", CONFIG.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if CONFIG.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_ansi(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    ensure_bootstrap_admin(&conn).await?;

    let state = AppState::from_config(conn).await?;

    scheduler::start_scheduler(state.scanner.clone(), state.audit.clone());

    Ok(state)
}

/// Create the configured superadmin when the users table is empty
pub async fn ensure_bootstrap_admin(db: &DbConn) -> anyhow::Result<()> {
    let Some(admin) = CONFIG.auth.bootstrap_admin.as_ref() else {
        return Ok(());
    };
    if User::find().count(db).await? > 0 {
        return Ok(());
    }

    let superadmin_role = Role::find()
        .filter(role::Column::Name.eq("superadmin"))
        .one(db)
        .await?;

    let now = chrono::Utc::now();
    let created = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        hashed_password: Set(hash_password(&admin.password)?),
        role: Set("superadmin".to_string()),
        role_id: Set(superadmin_role.map(|r| r.id)),
        company_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = created.id, username = %created.username, "Created bootstrap superadmin");
    Ok(())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = CONFIG
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    endpoints::create_router(state)
        .layer(axum_middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let ip: std::net::IpAddr = CONFIG
        .server
        .host
        .parse()
        .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::from((ip, CONFIG.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
