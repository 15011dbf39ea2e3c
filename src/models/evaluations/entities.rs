use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserRole;

// 评教状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "evaluation.ts")]
pub enum EvaluationStatus {
    Draft,
    Submitted,
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Draft => write!(f, "draft"),
            EvaluationStatus::Submitted => write!(f, "submitted"),
        }
    }
}

impl std::str::FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EvaluationStatus::Draft),
            "submitted" => Ok(EvaluationStatus::Submitted),
            _ => Err(format!("Invalid evaluation status: {s}")),
        }
    }
}

// 评教记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct Evaluation {
    pub id: i64,
    /// 学生评教时为 students.id
    pub student_id: Option<i64>,
    pub evaluator_user_id: i64,
    pub evaluator_role: UserRole,
    pub faculty_id: i64,
    pub subject: String,
    pub semester: String,
    pub academic_year: String,
    pub overall_rating: f64,
    pub status: EvaluationStatus,
    pub is_anonymous: bool,
    pub is_self: bool,
    pub comments: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 单项指标评分
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct EvaluationResponseItem {
    pub id: i64,
    pub evaluation_id: i64,
    pub criterion_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

// 评教详情
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct EvaluationDetail {
    pub evaluation: Evaluation,
    pub responses: Vec<EvaluationResponseItem>,
}

/// 评教人身份，由请求上下文推导，不接受客户端传入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluator {
    Student { user_id: i64, student_id: i64 },
    FacultySelf { user_id: i64 },
    Dean { user_id: i64 },
}

impl Evaluator {
    pub fn user_id(&self) -> i64 {
        match self {
            Evaluator::Student { user_id, .. }
            | Evaluator::FacultySelf { user_id }
            | Evaluator::Dean { user_id } => *user_id,
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Evaluator::Student { .. } => UserRole::Student,
            Evaluator::FacultySelf { .. } => UserRole::Faculty,
            Evaluator::Dean { .. } => UserRole::Dean,
        }
    }

    pub fn student_id(&self) -> Option<i64> {
        match self {
            Evaluator::Student { student_id, .. } => Some(*student_id),
            Evaluator::FacultySelf { .. } | Evaluator::Dean { .. } => None,
        }
    }

    pub fn is_self(&self) -> bool {
        matches!(self, Evaluator::FacultySelf { .. })
    }
}
