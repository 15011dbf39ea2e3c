use super::entities::Subject;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "subject.ts")]
pub struct SubjectListResponse {
    pub items: Vec<Subject>,
}
