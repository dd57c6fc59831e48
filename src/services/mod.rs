pub mod audit;
pub mod auth;
pub mod authorization;
pub mod claims;
pub mod company;
pub mod encryption;
pub mod hierarchy;
pub mod notification;
pub mod notification_settings;
pub mod report;
pub mod role;
pub mod scheduler;
pub mod security;
pub mod two_factor;

pub use audit::{AuditEntry, AuditService, ClientMeta};
pub use auth::{AuthService, LoginOutcome};
pub use authorization::{AccessTier, AuthorizationEngine, Principal, VisibleCompanies, VisibleUsers};
pub use claims::{ClaimsIssuer, IssuedToken};
pub use company::CompanyService;
pub use encryption::SecretCipher;
pub use hierarchy::HierarchyService;
pub use notification::{ExpiryScanner, NotificationService};
pub use report::ReportService;
pub use role::RoleService;
pub use two_factor::TwoFactorService;
