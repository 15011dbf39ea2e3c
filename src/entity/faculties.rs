//! 教师档案实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "faculties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    #[sea_orm(unique)]
    pub employee_id: String,
    pub position: Option<String>,
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
    #[sea_orm(has_many = "super::faculty_subjects::Entity")]
    FacultySubjects,
    #[sea_orm(has_many = "super::evaluations::Entity")]
    Evaluations,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::faculty_subjects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FacultySubjects.def()
    }
}

impl Related<super::evaluations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evaluations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_profile(self) -> crate::models::users::entities::FacultyProfile {
        crate::models::users::entities::FacultyProfile {
            id: self.id,
            user_id: self.user_id,
            employee_id: self.employee_id,
            position: self.position,
        }
    }

    /// 与用户记录合并为教师摘要
    pub fn into_summary(
        self,
        user: super::users::Model,
    ) -> crate::models::faculties::entities::FacultySummary {
        crate::models::faculties::entities::FacultySummary {
            faculty_id: self.id,
            user_id: self.user_id,
            employee_id: self.employee_id,
            first_name: user.first_name,
            last_name: user.last_name,
            department: user.department,
            position: self.position,
            status: user
                .status
                .parse()
                .unwrap_or(crate::models::users::entities::UserStatus::Inactive),
        }
    }
}
