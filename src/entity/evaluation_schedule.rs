//! 评教时间窗口实体（单例）

use sea_orm::entity::prelude::*;

/// 单例行的固定主键
pub const SCHEDULE_ROW_ID: i64 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "evaluation_schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    pub override_mode: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notice: Option<String>,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_schedule(self) -> crate::models::schedule::entities::EvaluationSchedule {
        use crate::models::schedule::entities::{EvaluationSchedule, OverrideMode};
        use chrono::{DateTime, Utc};

        EvaluationSchedule {
            start_at: self
                .start_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            end_at: self
                .end_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            // 无法识别的模式按关闭处理
            override_mode: self
                .override_mode
                .parse::<OverrideMode>()
                .unwrap_or(OverrideMode::Closed),
            notice: self.notice,
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
            updated_by: self.updated_by,
        }
    }
}
