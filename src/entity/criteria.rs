//! 评教指标实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "criteria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::evaluation_responses::Entity")]
    EvaluationResponses,
}

impl Related<super::evaluation_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EvaluationResponses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_criterion(self) -> crate::models::criteria::entities::Criterion {
        use crate::models::criteria::entities::Criterion;
        use chrono::{DateTime, Utc};

        Criterion {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
