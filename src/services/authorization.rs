//! Authorization decision engine
//!
//! Every "superadmin sees all / admin sees own subtree / user sees own" check
//! goes through [`AuthorizationEngine`]. Role labels are never compared ad hoc
//! elsewhere in the crate.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::Result;
use crate::models::permission::PermissionScope;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::hierarchy::HierarchyService;

/// Wildcard permission granted to superadmin-tier principals
pub const WILDCARD_PERMISSION: &str = "*";

/// Authenticated caller, as carried in a verified token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role_id: Option<i64>,
    pub role_name: String,
    pub company_id: Option<i64>,
    pub company_level: Option<i32>,
    pub hierarchy_scope: PermissionScope,
    pub permissions: Vec<String>,
}

/// Authorization tier derived from a principal's role and company
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    SuperAdmin,
    Admin,
    Regular,
}

/// Companies a principal may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibleCompanies {
    All,
    Set(Vec<i64>),
}

impl VisibleCompanies {
    pub fn contains(&self, company_id: i64) -> bool {
        match self {
            VisibleCompanies::All => true,
            VisibleCompanies::Set(ids) => ids.contains(&company_id),
        }
    }
}

/// Users whose rows a principal may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibleUsers {
    All,
    Set(Vec<i64>),
}

impl VisibleUsers {
    pub fn contains(&self, user_id: i64) -> bool {
        match self {
            VisibleUsers::All => true,
            VisibleUsers::Set(ids) => ids.contains(&user_id),
        }
    }
}

/// Permissions for accounts whose structured role grants nothing,
/// keyed by the legacy role label
pub fn default_permissions_for(role_name: &str) -> Vec<String> {
    let names: &[&str] = match role_name.trim().to_lowercase().as_str() {
        "superadmin" | "administrator" => &[WILDCARD_PERMISSION],
        "admin" => &[
            "view_dashboard",
            "manage_users",
            "manage_documents",
            "view_reports",
        ],
        "manager" => &["view_dashboard", "view_documents", "view_reports"],
        _ => &["view_dashboard", "view_documents"],
    };
    names.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    superadmin_labels: HashSet<String>,
}

impl Default for AuthorizationEngine {
    fn default() -> Self {
        Self::new(CONFIG.auth.superadmin_roles.iter().cloned())
    }
}

impl AuthorizationEngine {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let superadmin_labels = labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        Self { superadmin_labels }
    }

    pub fn superadmin_labels(&self) -> impl Iterator<Item = &str> {
        self.superadmin_labels.iter().map(String::as_str)
    }

    pub fn is_super_admin_like(&self, role_name: &str) -> bool {
        self.superadmin_labels
            .contains(&role_name.trim().to_lowercase())
    }

    pub fn is_admin_like(&self, role_name: &str) -> bool {
        role_name.trim().eq_ignore_ascii_case("admin") && !self.is_super_admin_like(role_name)
    }

    /// An admin without a company has no subtree to administer and is treated as regular.
    pub fn tier(&self, principal: &Principal) -> AccessTier {
        if self.is_super_admin_like(&principal.role_name) {
            AccessTier::SuperAdmin
        } else if self.is_admin_like(&principal.role_name) && principal.company_id.is_some() {
            AccessTier::Admin
        } else {
            AccessTier::Regular
        }
    }

    pub fn has_permission(&self, principal: &Principal, permission: &str) -> bool {
        if self.is_super_admin_like(&principal.role_name) {
            return true;
        }
        principal
            .permissions
            .iter()
            .any(|p| p == permission || p == WILDCARD_PERMISSION)
    }

    /// Own company or any company below it; superadmin-tier sees everything.
    pub async fn can_access_company(
        &self,
        hierarchy: &HierarchyService,
        principal: &Principal,
        target_company_id: i64,
    ) -> Result<bool> {
        if self.is_super_admin_like(&principal.role_name) {
            return Ok(true);
        }
        let Some(own) = principal.company_id else {
            return Ok(false);
        };
        if own == target_company_id {
            return Ok(true);
        }
        hierarchy.is_descendant_of(target_company_id, own).await
    }

    pub async fn resolve_visible_company_set(
        &self,
        hierarchy: &HierarchyService,
        principal: &Principal,
    ) -> Result<VisibleCompanies> {
        match self.tier(principal) {
            AccessTier::SuperAdmin => Ok(VisibleCompanies::All),
            AccessTier::Admin => {
                let Some(own) = principal.company_id else {
                    return Ok(VisibleCompanies::Set(Vec::new()));
                };
                let mut ids = vec![own];
                ids.extend(hierarchy.descendant_ids(own).await?);
                Ok(VisibleCompanies::Set(ids))
            }
            AccessTier::Regular => Ok(VisibleCompanies::Set(
                principal.company_id.into_iter().collect(),
            )),
        }
    }

    /// Regular users only ever see their own rows, regardless of company.
    pub async fn resolve_visible_user_ids(
        &self,
        hierarchy: &HierarchyService,
        principal: &Principal,
    ) -> Result<VisibleUsers> {
        match self.tier(principal) {
            AccessTier::SuperAdmin => Ok(VisibleUsers::All),
            AccessTier::Regular => Ok(VisibleUsers::Set(vec![principal.user_id])),
            AccessTier::Admin => {
                let VisibleCompanies::Set(company_ids) =
                    self.resolve_visible_company_set(hierarchy, principal).await?
                else {
                    return Ok(VisibleUsers::All);
                };
                if company_ids.is_empty() {
                    return Ok(VisibleUsers::Set(vec![principal.user_id]));
                }

                let mut ids: Vec<i64> = User::find()
                    .select_only()
                    .column(user::Column::Id)
                    .filter(user::Column::CompanyId.is_in(company_ids))
                    .into_tuple()
                    .all(hierarchy.db())
                    .await?;
                if !ids.contains(&principal.user_id) {
                    ids.push(principal.user_id);
                }
                Ok(VisibleUsers::Set(ids))
            }
        }
    }

    /// Whether the principal may act on a row owned by `owner_user_id`
    pub async fn can_act_on_user(
        &self,
        hierarchy: &HierarchyService,
        principal: &Principal,
        owner_user_id: i64,
    ) -> Result<bool> {
        match self.tier(principal) {
            AccessTier::SuperAdmin => Ok(true),
            AccessTier::Regular => Ok(principal.user_id == owner_user_id),
            AccessTier::Admin => {
                if principal.user_id == owner_user_id {
                    return Ok(true);
                }
                let owner_company: Option<Option<i64>> = User::find_by_id(owner_user_id)
                    .select_only()
                    .column(user::Column::CompanyId)
                    .into_tuple()
                    .one(hierarchy.db())
                    .await?;
                match owner_company.flatten() {
                    Some(company_id) => {
                        self.can_access_company(hierarchy, principal, company_id)
                            .await
                    }
                    None => Ok(false),
                }
            }
        }
    }
}
