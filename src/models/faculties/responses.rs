use super::entities::FacultySummary;
use crate::models::subjects::entities::Subject;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "faculty.ts")]
pub struct FacultyListResponse {
    pub items: Vec<FacultySummary>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "faculty.ts")]
pub struct FacultySubjectsResponse {
    pub faculty_id: i64,
    pub subjects: Vec<Subject>,
}
