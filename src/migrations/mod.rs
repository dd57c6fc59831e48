pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_companies;
mod m20260301_000002_create_roles;
mod m20260301_000003_create_permissions;
mod m20260301_000004_create_role_permissions;
mod m20260301_000005_create_users;
mod m20260301_000006_create_two_factor_auths;
mod m20260301_000007_create_notifications;
mod m20260301_000008_create_notification_settings;
mod m20260301_000009_create_documents;
mod m20260301_000010_create_directors;
mod m20260301_000011_create_financial_reports;
mod m20260301_000012_create_audit_logs;
mod m20260301_000013_seed_defaults;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_companies::Migration),
            Box::new(m20260301_000002_create_roles::Migration),
            Box::new(m20260301_000003_create_permissions::Migration),
            Box::new(m20260301_000004_create_role_permissions::Migration),
            Box::new(m20260301_000005_create_users::Migration),
            Box::new(m20260301_000006_create_two_factor_auths::Migration),
            Box::new(m20260301_000007_create_notifications::Migration),
            Box::new(m20260301_000008_create_notification_settings::Migration),
            Box::new(m20260301_000009_create_documents::Migration),
            Box::new(m20260301_000010_create_directors::Migration),
            Box::new(m20260301_000011_create_financial_reports::Migration),
            Box::new(m20260301_000012_create_audit_logs::Migration),
            Box::new(m20260301_000013_seed_defaults::Migration),
        ]
    }
}
