//! 评教记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: Option<i64>,
    pub evaluator_user_id: i64,
    pub evaluator_role: String,
    pub faculty_id: i64,
    pub subject: String,
    pub semester: String,
    pub academic_year: String,
    #[sea_orm(column_type = "Double")]
    pub overall_rating: f64,
    pub status: String,
    pub is_anonymous: bool,
    pub is_self: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub submitted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::faculties::Entity",
        from = "Column::FacultyId",
        to = "super::faculties::Column::Id"
    )]
    Faculty,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
    #[sea_orm(has_many = "super::evaluation_responses::Entity")]
    Responses,
}

impl Related<super::faculties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::evaluation_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_evaluation(self) -> crate::models::evaluations::entities::Evaluation {
        use crate::models::evaluations::entities::{Evaluation, EvaluationStatus};
        use crate::models::users::entities::UserRole;
        use chrono::{DateTime, Utc};

        Evaluation {
            id: self.id,
            student_id: self.student_id,
            evaluator_user_id: self.evaluator_user_id,
            evaluator_role: self
                .evaluator_role
                .parse::<UserRole>()
                .unwrap_or(UserRole::Student),
            faculty_id: self.faculty_id,
            subject: self.subject,
            semester: self.semester,
            academic_year: self.academic_year,
            overall_rating: self.overall_rating,
            status: self
                .status
                .parse::<EvaluationStatus>()
                .unwrap_or(EvaluationStatus::Draft),
            is_anonymous: self.is_anonymous,
            is_self: self.is_self,
            comments: self.comments,
            submitted_at: self
                .submitted_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
