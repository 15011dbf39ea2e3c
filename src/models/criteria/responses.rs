use super::entities::Criterion;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "criteria.ts")]
pub struct CriteriaListResponse {
    pub items: Vec<Criterion>,
}
