//! Financial reports, one per company and `YYYY-MM` period

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::financial_report;
use crate::models::prelude::*;
use crate::schemas::{CreateReportRequest, UpdateReportRequest};
use crate::services::authorization::{
    AccessTier, AuthorizationEngine, Principal, VisibleCompanies,
};
use crate::services::hierarchy::HierarchyService;
use crate::state::DbConn;

/// `YYYY-MM` with a month in 01..=12
pub fn is_valid_period(period: &str) -> bool {
    let bytes = period.as_bytes();
    if !period.is_ascii() || bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    let (year, month) = (&period[..4], &period[5..]);
    if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u32>(), Ok(1..=12))
}

fn check_period(period: &str) -> Result<()> {
    if is_valid_period(period) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Period must be in YYYY-MM format".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct ReportService {
    db: DbConn,
    hierarchy: HierarchyService,
    engine: AuthorizationEngine,
}

impl ReportService {
    pub fn new(db: DbConn, hierarchy: HierarchyService, engine: AuthorizationEngine) -> Self {
        Self {
            db,
            hierarchy,
            engine,
        }
    }

    /// Superadmin everything, admin own subtree, everyone else own company only
    pub async fn validate_report_access(
        &self,
        principal: &Principal,
        report_company_id: i64,
    ) -> Result<bool> {
        if self.engine.tier(principal) == AccessTier::SuperAdmin {
            return Ok(true);
        }
        let Some(own) = principal.company_id else {
            return Ok(false);
        };
        if own == report_company_id {
            return Ok(true);
        }
        match self.engine.tier(principal) {
            AccessTier::Admin => self.hierarchy.is_descendant_of(report_company_id, own).await,
            _ => Ok(false),
        }
    }

    async fn ensure_access(&self, principal: &Principal, company_id: i64) -> Result<()> {
        if self.validate_report_access(principal, company_id).await? {
            Ok(())
        } else {
            Err(AppError::access_denied())
        }
    }

    async fn ensure_period_free(
        &self,
        company_id: i64,
        period: &str,
        except_id: Option<i64>,
    ) -> Result<()> {
        let mut select = FinancialReport::find()
            .filter(financial_report::Column::CompanyId.eq(company_id))
            .filter(financial_report::Column::Period.eq(period));
        if let Some(id) = except_id {
            select = select.filter(financial_report::Column::Id.ne(id));
        }
        if select.one(&self.db).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A report for period {} already exists for this company",
                period
            )));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateReportRequest,
    ) -> Result<financial_report::Model> {
        request.validate()?;
        check_period(&request.period)?;
        self.ensure_access(principal, request.company_id).await?;
        self.hierarchy.get_by_id(request.company_id).await?;
        self.ensure_period_free(request.company_id, &request.period, None)
            .await?;

        let now = chrono::Utc::now();
        let report = financial_report::ActiveModel {
            company_id: Set(request.company_id),
            period: Set(request.period),
            revenue: Set(request.revenue),
            expenses: Set(request.expenses),
            net_profit: Set(request.revenue - request.expenses),
            notes: Set(request.notes),
            created_by: Set(principal.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            report_id = report.id,
            company_id = report.company_id,
            period = %report.period,
            "Financial report created"
        );
        Ok(report)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> Result<financial_report::Model> {
        let report = FinancialReport::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
        self.ensure_access(principal, report.company_id).await?;
        Ok(report)
    }

    pub async fn list_for_principal(
        &self,
        principal: &Principal,
    ) -> Result<Vec<financial_report::Model>> {
        let mut select = FinancialReport::find()
            .order_by_desc(financial_report::Column::Period)
            .order_by_asc(financial_report::Column::CompanyId);

        match self
            .engine
            .resolve_visible_company_set(&self.hierarchy, principal)
            .await?
        {
            VisibleCompanies::All => {}
            VisibleCompanies::Set(ids) if ids.is_empty() => return Err(AppError::access_denied()),
            VisibleCompanies::Set(ids) => {
                select = select.filter(financial_report::Column::CompanyId.is_in(ids));
            }
        }

        Ok(select.all(&self.db).await?)
    }

    pub async fn list_by_company(
        &self,
        principal: &Principal,
        company_id: i64,
    ) -> Result<Vec<financial_report::Model>> {
        self.ensure_access(principal, company_id).await?;
        Ok(FinancialReport::find()
            .filter(financial_report::Column::CompanyId.eq(company_id))
            .order_by_desc(financial_report::Column::Period)
            .all(&self.db)
            .await?)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        request: UpdateReportRequest,
    ) -> Result<financial_report::Model> {
        request.validate()?;
        let existing = self.get(principal, id).await?;

        if let Some(period) = &request.period {
            check_period(period)?;
            if *period != existing.period {
                self.ensure_period_free(existing.company_id, period, Some(existing.id))
                    .await?;
            }
        }

        let revenue = request.revenue.unwrap_or(existing.revenue);
        let expenses = request.expenses.unwrap_or(existing.expenses);

        let mut active: financial_report::ActiveModel = existing.into();
        if let Some(period) = request.period {
            active.period = Set(period);
        }
        if request.notes.is_some() {
            active.notes = Set(request.notes);
        }
        active.revenue = Set(revenue);
        active.expenses = Set(expenses);
        active.net_profit = Set(revenue - expenses);
        active.updated_at = Set(chrono::Utc::now());

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<()> {
        let existing = self.get(principal, id).await?;
        FinancialReport::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;
        tracing::info!(report_id = id, "Financial report deleted");
        Ok(())
    }
}
