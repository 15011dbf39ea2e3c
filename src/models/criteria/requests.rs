use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "criteria.ts")]
pub struct CriteriaListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "criteria.ts")]
pub struct CreateCriterionRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "criteria.ts")]
pub struct UpdateCriterionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
