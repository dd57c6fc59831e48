use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::company;

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateCompany {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateCompany {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `parent_id = null` moves the company to the root
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct MoveCompany {
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MoveCompanyResponse {
    pub company: company::Model,
    pub levels_updated: usize,
}
