use super::entities::Evaluation;
use crate::models::common::PaginationInfo;
use crate::models::schedule::entities::ActivePeriod;
use crate::models::users::entities::UserRole;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct EvaluationListResponse {
    pub items: Vec<Evaluation>,
    pub pagination: PaginationInfo,
}

// 单项指标平均分
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct CriterionAverage {
    pub criterion_id: i64,
    pub title: String,
    pub average: f64,
    pub responses: i64,
}

/// 评语，匿名评教不带评教人
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct ResultComment {
    pub evaluator_role: UserRole,
    pub evaluator_name: Option<String>,
    pub comment: String,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 教师评教结果汇总
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct FacultyResultsResponse {
    pub faculty_id: i64,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub total_evaluations: i64,
    pub overall_average: Option<f64>,
    pub criteria: Vec<CriterionAverage>,
    pub comments: Vec<ResultComment>,
}

// 待评教的教师与课程
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct PendingEvaluation {
    pub faculty_id: i64,
    pub faculty_name: String,
    pub subject_code: String,
    pub subject_name: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct PendingEvaluationsResponse {
    pub period: Option<ActivePeriod>,
    pub items: Vec<PendingEvaluation>,
}
