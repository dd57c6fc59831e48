use super::env_parse;

#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// Deepest level a company may sit at; deeper placements are clamped
    pub max_depth: i32,
    /// Upper bound on nodes processed by one level recompute
    pub recompute_cap: usize,
}

impl HierarchyConfig {
    pub fn from_env() -> Self {
        Self {
            max_depth: env_parse("DMS_MAX_COMPANY_DEPTH", 10),
            recompute_cap: env_parse("DMS_LEVEL_RECOMPUTE_CAP", 1000),
        }
    }
}
