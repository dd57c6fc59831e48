//! Migration: Create financial_reports table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_companies::Companies;
use super::m20260301_000005_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinancialReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialReports::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialReports::Period).string_len(7).not_null())
                    .col(
                        ColumnDef::new(FinancialReports::Revenue)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::Expenses)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::NetProfit)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(FinancialReports::Notes).text().null())
                    .col(
                        ColumnDef::new(FinancialReports::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FinancialReports::Table, FinancialReports::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FinancialReports::Table, FinancialReports::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_financial_reports_company_period")
                    .table(FinancialReports::Table)
                    .col(FinancialReports::CompanyId)
                    .col(FinancialReports::Period)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(FinancialReports::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "financial_reports"]
enum FinancialReports {
    Table,
    Id,
    #[iden = "company_id"]
    CompanyId,
    Period,
    Revenue,
    Expenses,
    #[iden = "net_profit"]
    NetProfit,
    Notes,
    #[iden = "created_by"]
    CreatedBy,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
