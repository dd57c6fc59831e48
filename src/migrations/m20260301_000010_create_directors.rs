//! Migration: Create directors table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_companies::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Directors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Directors::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Directors::FullName).string().not_null())
                    .col(ColumnDef::new(Directors::Position).string().not_null())
                    .col(ColumnDef::new(Directors::StartDate).date().null())
                    .col(ColumnDef::new(Directors::EndDate).date().null())
                    .col(
                        ColumnDef::new(Directors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Directors::Table, Directors::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_directors_end_date")
                    .table(Directors::Table)
                    .col(Directors::EndDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Directors::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "directors"]
enum Directors {
    Table,
    Id,
    #[iden = "company_id"]
    CompanyId,
    #[iden = "full_name"]
    FullName,
    Position,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    #[iden = "created_at"]
    CreatedAt,
}
