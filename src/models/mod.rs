pub mod audit_log;
pub mod company;
pub mod director;
pub mod document;
pub mod financial_report;
pub mod notification;
pub mod notification_settings;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod two_factor_auth;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::audit_log::{self, Entity as AuditLog};
    pub use super::company::{self, Entity as Company};
    pub use super::director::{self, Entity as Director};
    pub use super::document::{self, Entity as Document};
    pub use super::financial_report::{self, Entity as FinancialReport};
    pub use super::notification::{self, Entity as Notification};
    pub use super::notification_settings::{self, Entity as NotificationSettings};
    pub use super::permission::{self, Entity as Permission};
    pub use super::role::{self, Entity as Role};
    pub use super::role_permission::{self, Entity as RolePermission};
    pub use super::two_factor_auth::{self, Entity as TwoFactorAuth};
    pub use super::user::{self, Entity as User};
}
