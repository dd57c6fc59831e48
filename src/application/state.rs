
use sea_orm::DatabaseConnection;

use crate::error::Result;
use crate::middleware::LoginRateLimiter;
use crate::services::{
    AuditService, AuthService, AuthorizationEngine, ClaimsIssuer, CompanyService, ExpiryScanner,
    HierarchyService, NotificationService, ReportService, RoleService, SecretCipher,
    TwoFactorService,
};

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub engine: AuthorizationEngine,
    pub hierarchy: HierarchyService,
    pub claims: ClaimsIssuer,
    pub auth: AuthService,
    pub two_factor: TwoFactorService,
    pub companies: CompanyService,
    pub roles: RoleService,
    pub reports: ReportService,
    pub notifications: NotificationService,
    pub scanner: ExpiryScanner,
    pub audit: AuditService,
    pub login_limiter: LoginRateLimiter,
}

/// Pieces whose construction depends on configuration
pub struct StateParts {
    pub engine: AuthorizationEngine,
    pub hierarchy: HierarchyService,
    pub claims: ClaimsIssuer,
    pub two_factor: TwoFactorService,
    pub notifications: NotificationService,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Wire the services from explicit parts
    pub async fn assemble(db: DbConn, parts: StateParts) -> Self {
        let StateParts {
            engine,
            hierarchy,
            claims,
            two_factor,
            notifications,
            login_limiter,
        } = parts;

        let audit = AuditService::new();
        audit.set_db(db.clone()).await;

        let auth = AuthService::new(db.clone(), claims.clone(), two_factor.clone(), audit.clone());
        let scanner = ExpiryScanner::new(db.clone(), notifications.clone());

        Self {
            companies: CompanyService::new(db.clone(), hierarchy.clone()),
            roles: RoleService::new(db.clone()),
            reports: ReportService::new(db.clone(), hierarchy.clone(), engine.clone()),
            db,
            engine,
            hierarchy,
            claims,
            auth,
            two_factor,
            notifications,
            scanner,
            audit,
            login_limiter,
        }
    }

    /// Wire the services from `CONFIG`
    pub async fn from_config(db: DbConn) -> Result<Self> {
        let engine = AuthorizationEngine::default();
        let hierarchy = HierarchyService::from_config(db.clone());
        let claims = ClaimsIssuer::from_config(db.clone(), engine.clone());
        let cipher = SecretCipher::from_config()?;
        let two_factor = TwoFactorService::from_config(db.clone(), cipher);
        let notifications =
            NotificationService::from_config(db.clone(), hierarchy.clone(), engine.clone());

        Ok(Self::assemble(
            db,
            StateParts {
                engine,
                hierarchy,
                claims,
                two_factor,
                notifications,
                login_limiter: LoginRateLimiter::from_config(),
            },
        )
        .await)
    }
}
