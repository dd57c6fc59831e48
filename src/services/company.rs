use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::error::{AppError, Result};
use crate::models::company;
use crate::models::prelude::*;
use crate::schemas::{CreateCompany, UpdateCompany};
use crate::services::hierarchy::{HierarchyService, RecomputeOutcome};
use crate::state::DbConn;

#[derive(Clone)]
pub struct CompanyService {
    db: DbConn,
    hierarchy: HierarchyService,
}

impl CompanyService {
    pub fn new(db: DbConn, hierarchy: HierarchyService) -> Self {
        Self { db, hierarchy }
    }

    pub fn hierarchy(&self) -> &HierarchyService {
        &self.hierarchy
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        let taken = Company::find()
            .filter(company::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Conflict(format!(
                "Company code '{}' already exists",
                code
            )));
        }
        Ok(())
    }

    async fn level_under(&self, parent_id: Option<i64>) -> Result<i32> {
        match parent_id {
            Some(parent_id) => {
                let parent = self.hierarchy.get_by_id(parent_id).await?;
                Ok(self.hierarchy.level_for_parent(parent.level))
            }
            None => Ok(0),
        }
    }

    pub async fn create(&self, request: CreateCompany) -> Result<company::Model> {
        let code = request.code.trim().to_string();
        self.ensure_code_free(&code).await?;
        // The parent's level must not change between the read and the insert
        let _moving = self.hierarchy.lock_moves().await;
        let level = self.level_under(request.parent_id).await?;

        let now = chrono::Utc::now();
        let created = company::ActiveModel {
            name: Set(request.name.trim().to_string()),
            code: Set(code),
            description: Set(request.description),
            parent_id: Set(request.parent_id),
            level: Set(level),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            company_id = created.id,
            parent_id = ?created.parent_id,
            level = created.level,
            "Company created"
        );
        Ok(created)
    }

    pub async fn update(&self, id: i64, request: UpdateCompany) -> Result<company::Model> {
        let existing = self.hierarchy.get_by_id(id).await?;
        let mut active: company::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        active.updated_at = Set(chrono::Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// Re-parent a company and recompute levels across its subtree
    pub async fn move_company(
        &self,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<(company::Model, RecomputeOutcome)> {
        let _moving = self.hierarchy.lock_moves().await;
        let existing = self.hierarchy.get_by_id(id).await?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(AppError::BadRequest(
                    "A company cannot be its own parent".to_string(),
                ));
            }
            if self.hierarchy.is_descendant_of(parent_id, id).await? {
                return Err(AppError::BadRequest(
                    "A company cannot be moved under its own descendant".to_string(),
                ));
            }
        }

        let level = self.level_under(new_parent_id).await?;
        let mut active: company::ActiveModel = existing.into();
        active.parent_id = Set(new_parent_id);
        active.level = Set(level);
        active.updated_at = Set(chrono::Utc::now());
        let moved = active.update(&self.db).await?;

        let outcome = self.hierarchy.recompute_subtree_levels(id).await?;

        tracing::info!(
            company_id = id,
            parent_id = ?new_parent_id,
            level,
            levels_updated = outcome.updated,
            "Company moved"
        );
        Ok((moved, outcome))
    }

    /// Soft delete
    pub async fn deactivate(&self, id: i64) -> Result<company::Model> {
        let existing = self.hierarchy.get_by_id(id).await?;
        let mut active: company::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now());
        let updated = active.update(&self.db).await?;
        tracing::info!(company_id = id, "Company deactivated");
        Ok(updated)
    }
}
