use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateReportRequest {
    pub company_id: i64,
    /// `YYYY-MM`
    pub period: String,
    pub revenue: f64,
    pub expenses: f64,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateReportRequest {
    pub period: Option<String>,
    pub revenue: Option<f64>,
    pub expenses: Option<f64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
