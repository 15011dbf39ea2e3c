use super::entities::{AdmissionDecision, EvaluationSchedule, ScheduleAudit};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct ScheduleStatusResponse {
    pub schedule: EvaluationSchedule,
    pub admission: AdmissionDecision,
    pub server_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct ScheduleAuditListResponse {
    pub items: Vec<ScheduleAudit>,
    pub pagination: PaginationInfo,
}
