//! 学生档案实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    #[sea_orm(unique)]
    pub student_number: String,
    pub gender: String,
    pub program: Option<String>,
    pub year_level: Option<i32>,
    pub section: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_profile(self) -> crate::models::users::entities::StudentProfile {
        use crate::models::users::entities::{Gender, StudentProfile};

        StudentProfile {
            id: self.id,
            user_id: self.user_id,
            gender: self.gender.parse::<Gender>().unwrap_or_else(|_| {
                // 学号前缀与性别一一对应
                if self.student_number.starts_with(Gender::Female.id_prefix()) {
                    Gender::Female
                } else {
                    Gender::Male
                }
            }),
            student_number: self.student_number,
            program: self.program,
            year_level: self.year_level,
            section: self.section,
        }
    }
}
