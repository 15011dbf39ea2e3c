use serde::Deserialize;
use ts_rs::TS;

use super::entities::Evaluator;
use crate::models::schedule::entities::{ActivePeriod, Semester};
use crate::models::users::entities::UserRole;

// 单个指标的评分
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct RatingInput {
    pub criterion_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

/// 提交评教请求
///
/// 学期与学年由服务端根据当前日期计算，请求中不包含这两个字段。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct SubmitEvaluationRequest {
    pub faculty_id: i64,
    pub subject: String,
    pub responses: Vec<RatingInput>,
    pub comments: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

// 管理员评教列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct EvaluationListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub faculty_id: Option<i64>,
    pub subject: Option<String>,
    pub semester: Option<Semester>,
    pub academic_year: Option<String>,
    pub evaluator_role: Option<UserRole>,
}

// 评教列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct EvaluationListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub faculty_id: Option<i64>,
    pub subject: Option<String>,
    pub semester: Option<Semester>,
    pub academic_year: Option<String>,
    pub evaluator_role: Option<UserRole>,
    pub evaluator_user_id: Option<i64>,
}

// 结果汇总筛选，缺省为当前学期
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "evaluation.ts")]
pub struct ResultsParams {
    pub semester: Option<Semester>,
    pub academic_year: Option<String>,
}

/// 存储层写入的新评教，评分已通过校验
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub evaluator: Evaluator,
    pub faculty_id: i64,
    pub subject: String,
    pub period: ActivePeriod,
    pub ratings: Vec<RatingInput>,
    pub comments: Option<String>,
    pub is_anonymous: bool,
}

impl NewEvaluation {
    /// 各项评分的平均值
    pub fn overall_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let sum: i64 = self.ratings.iter().map(|r| i64::from(r.rating)).sum();
        sum as f64 / self.ratings.len() as f64
    }
}
