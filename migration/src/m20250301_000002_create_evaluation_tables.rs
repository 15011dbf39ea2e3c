use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_identity_tables::{Faculties, Students};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 评教窗口单例行的固定主键
const SCHEDULE_ROW_ID: i64 = 1;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 评价指标 ====================
        manager
            .create_table(
                Table::create()
                    .table(Criteria::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Criteria::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Criteria::Title).string().not_null())
                    .col(ColumnDef::new(Criteria::Description).text().null())
                    .col(ColumnDef::new(Criteria::Category).string().null())
                    .col(
                        ColumnDef::new(Criteria::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Criteria::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Criteria::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Criteria::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ==================== 评教时间窗口（单例） ====================
        manager
            .create_table(
                Table::create()
                    .table(EvaluationSchedule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvaluationSchedule::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvaluationSchedule::StartAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(EvaluationSchedule::EndAt).big_integer().null())
                    .col(
                        ColumnDef::new(EvaluationSchedule::OverrideMode)
                            .string()
                            .not_null()
                            .default("auto"),
                    )
                    .col(ColumnDef::new(EvaluationSchedule::Notice).text().null())
                    .col(
                        ColumnDef::new(EvaluationSchedule::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationSchedule::UpdatedBy)
                            .big_integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 评教窗口审计日志 ====================
        manager
            .create_table(
                Table::create()
                    .table(EvaluationScheduleAudit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::Action)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::OldValue)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::NewValue)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::ChangedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::ChangedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationScheduleAudit::IpAddress)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 评教记录 ====================
        manager
            .create_table(
                Table::create()
                    .table(Evaluations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Evaluations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Evaluations::StudentId).big_integer().null())
                    .col(
                        ColumnDef::new(Evaluations::EvaluatorUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evaluations::EvaluatorRole)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evaluations::FacultyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Evaluations::Subject).string().not_null())
                    .col(ColumnDef::new(Evaluations::Semester).string().not_null())
                    .col(ColumnDef::new(Evaluations::AcademicYear).string().not_null())
                    .col(
                        ColumnDef::new(Evaluations::OverallRating)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Evaluations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Evaluations::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Evaluations::IsSelf)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Evaluations::Comments).text().null())
                    .col(ColumnDef::new(Evaluations::SubmittedAt).big_integer().null())
                    .col(ColumnDef::new(Evaluations::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Evaluations::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Evaluations::Table, Evaluations::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Evaluations::Table, Evaluations::FacultyId)
                            .to(Faculties::Table, Faculties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 评教明细 ====================
        manager
            .create_table(
                Table::create()
                    .table(EvaluationResponses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvaluationResponses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResponses::EvaluationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResponses::CriterionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResponses::Rating)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EvaluationResponses::Comment).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(EvaluationResponses::Table, EvaluationResponses::EvaluationId)
                            .to(Evaluations::Table, Evaluations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EvaluationResponses::Table, EvaluationResponses::CriterionId)
                            .to(Criteria::Table, Criteria::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一评价人对同一教师、课程、学期只能有一条记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluations_unique_evaluator")
                    .table(Evaluations::Table)
                    .col(Evaluations::EvaluatorUserId)
                    .col(Evaluations::EvaluatorRole)
                    .col(Evaluations::FacultyId)
                    .col(Evaluations::Subject)
                    .col(Evaluations::Semester)
                    .col(Evaluations::AcademicYear)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluations_faculty_id")
                    .table(Evaluations::Table)
                    .col(Evaluations::FacultyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluations_period")
                    .table(Evaluations::Table)
                    .col(Evaluations::Semester)
                    .col(Evaluations::AcademicYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluation_responses_unique")
                    .table(EvaluationResponses::Table)
                    .col(EvaluationResponses::EvaluationId)
                    .col(EvaluationResponses::CriterionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluation_schedule_audit_changed_at")
                    .table(EvaluationScheduleAudit::Table)
                    .col(EvaluationScheduleAudit::ChangedAt)
                    .to_owned(),
            )
            .await?;

        // ==================== 默认数据 ====================
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let schedule = Query::insert()
            .into_table(EvaluationSchedule::Table)
            .columns([
                EvaluationSchedule::Id,
                EvaluationSchedule::OverrideMode,
                EvaluationSchedule::UpdatedAt,
            ])
            .values_panic([SCHEDULE_ROW_ID.into(), "auto".into(), now.into()])
            .to_owned();
        manager.exec_stmt(schedule).await?;

        let default_criteria = [
            (
                "Knowledge of subject matter",
                "Demonstrates mastery of the subject and relates it to current trends",
                "Instruction",
            ),
            (
                "Teaching methodology",
                "Uses strategies and materials that help students understand the lessons",
                "Instruction",
            ),
            (
                "Classroom management",
                "Maintains an orderly environment that supports learning",
                "Management",
            ),
            (
                "Communication skills",
                "Explains ideas clearly and responds to questions respectfully",
                "Instruction",
            ),
            (
                "Fairness in assessment",
                "Grades objectively and explains the basis of evaluation",
                "Assessment",
            ),
            (
                "Punctuality and attendance",
                "Starts and ends classes on time and is present as scheduled",
                "Professionalism",
            ),
        ];

        for (index, (title, description, category)) in default_criteria.into_iter().enumerate() {
            let insert = Query::insert()
                .into_table(Criteria::Table)
                .columns([
                    Criteria::Title,
                    Criteria::Description,
                    Criteria::Category,
                    Criteria::SortOrder,
                    Criteria::IsActive,
                    Criteria::CreatedAt,
                    Criteria::UpdatedAt,
                ])
                .values_panic([
                    title.into(),
                    description.into(),
                    category.into(),
                    (index as i32 + 1).into(),
                    true.into(),
                    now.into(),
                    now.into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EvaluationResponses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Evaluations::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(EvaluationScheduleAudit::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(EvaluationSchedule::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Criteria::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Criteria {
    #[sea_orm(iden = "criteria")]
    Table,
    Id,
    Title,
    Description,
    Category,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvaluationSchedule {
    #[sea_orm(iden = "evaluation_schedule")]
    Table,
    Id,
    StartAt,
    EndAt,
    OverrideMode,
    Notice,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum EvaluationScheduleAudit {
    #[sea_orm(iden = "evaluation_schedule_audit")]
    Table,
    Id,
    Action,
    OldValue,
    NewValue,
    ChangedBy,
    ChangedAt,
    IpAddress,
}

#[derive(DeriveIden)]
enum Evaluations {
    #[sea_orm(iden = "evaluations")]
    Table,
    Id,
    StudentId,
    EvaluatorUserId,
    EvaluatorRole,
    FacultyId,
    Subject,
    Semester,
    AcademicYear,
    OverallRating,
    Status,
    IsAnonymous,
    IsSelf,
    Comments,
    SubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvaluationResponses {
    #[sea_orm(iden = "evaluation_responses")]
    Table,
    Id,
    EvaluationId,
    CriterionId,
    Rating,
    Comment,
}
