//! Migration: Create two_factor_auths table

use sea_orm_migration::prelude::*;

use super::m20260301_000005_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TwoFactorAuths::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TwoFactorAuths::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TwoFactorAuths::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TwoFactorAuths::Secret).text().not_null())
                    .col(
                        ColumnDef::new(TwoFactorAuths::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TwoFactorAuths::BackupCodes).text().null())
                    .col(
                        ColumnDef::new(TwoFactorAuths::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TwoFactorAuths::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TwoFactorAuths::Table, TwoFactorAuths::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TwoFactorAuths::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "two_factor_auths"]
enum TwoFactorAuths {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    Secret,
    Enabled,
    #[iden = "backup_codes"]
    BackupCodes,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
