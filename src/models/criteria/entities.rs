use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 评价指标
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "criteria.ts")]
pub struct Criterion {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 删除指标的结果：已有评分引用的指标只会被停用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionRemoval {
    Deleted,
    Deactivated,
    NotFound,
}
