//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod criteria;
mod evaluations;
mod faculties;
mod id_sequence;
mod schedule;
mod subjects;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use id_sequence::format_sequential_id;

use crate::config::AppConfig;
use crate::errors::{EvalSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 使用已有连接创建存储实例（不运行迁移）
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| EvalSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| EvalSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| EvalSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(EvalSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 写操作错误转换，唯一约束冲突单独映射
pub(crate) fn write_error(context: &str, err: DbErr) -> EvalSystemError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            EvalSystemError::conflict(format!("{context}: {detail}"))
        }
        _ => EvalSystemError::database_operation(format!("{context}: {err}")),
    }
}

// Storage trait 实现
use crate::models::{
    criteria::{
        entities::{Criterion, CriterionRemoval},
        requests::{CreateCriterionRequest, UpdateCriterionRequest},
    },
    evaluations::{
        entities::{Evaluation, EvaluationDetail},
        requests::{EvaluationListQuery, NewEvaluation},
        responses::{EvaluationListResponse, FacultyResultsResponse, PendingEvaluation},
    },
    faculties::{entities::FacultySummary, requests::FacultyListParams},
    schedule::{
        entities::{ActivePeriod, EvaluationSchedule},
        requests::{ScheduleAction, ScheduleAuditQuery},
        responses::ScheduleAuditListResponse,
    },
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
    },
    users::{
        entities::{RoleProfile, StudentProfile, User, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<(User, RoleProfile)> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_login_impl(identifier).await
    }

    async fn get_role_profile(&self, user_id: i64, role: UserRole) -> Result<RoleProfile> {
        self.get_role_profile_impl(user_id, role).await
    }

    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<StudentProfile>> {
        self.get_student_by_user_id_impl(user_id).await
    }

    async fn get_faculty_by_user_id(&self, user_id: i64) -> Result<Option<FacultySummary>> {
        self.get_faculty_by_user_id_impl(user_id).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool> {
        self.update_password_impl(id, password_hash, must_change_password)
            .await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 课程模块
    async fn list_subjects(&self, params: SubjectListParams) -> Result<Vec<Subject>> {
        self.list_subjects_impl(params).await
    }

    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_by_id_impl(id).await
    }

    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        self.create_subject_impl(req).await
    }

    async fn update_subject(&self, id: i64, req: UpdateSubjectRequest) -> Result<Option<Subject>> {
        self.update_subject_impl(id, req).await
    }

    async fn delete_subject(&self, id: i64) -> Result<bool> {
        self.delete_subject_impl(id).await
    }

    // 教师模块
    async fn list_faculties(&self, params: FacultyListParams) -> Result<Vec<FacultySummary>> {
        self.list_faculties_impl(params).await
    }

    async fn get_faculty_by_id(&self, faculty_id: i64) -> Result<Option<FacultySummary>> {
        self.get_faculty_by_id_impl(faculty_id).await
    }

    async fn list_faculty_subjects(&self, faculty_id: i64) -> Result<Vec<Subject>> {
        self.list_faculty_subjects_impl(faculty_id).await
    }

    async fn faculty_teaches_subject(&self, faculty_id: i64, subject_code: &str) -> Result<bool> {
        self.faculty_teaches_subject_impl(faculty_id, subject_code)
            .await
    }

    async fn assign_faculty_subjects(
        &self,
        faculty_id: i64,
        subject_ids: Vec<i64>,
    ) -> Result<Vec<Subject>> {
        self.assign_faculty_subjects_impl(faculty_id, subject_ids)
            .await
    }

    // 评教指标模块
    async fn list_criteria(&self, include_inactive: bool) -> Result<Vec<Criterion>> {
        self.list_criteria_impl(include_inactive).await
    }

    async fn create_criterion(&self, req: CreateCriterionRequest) -> Result<Criterion> {
        self.create_criterion_impl(req).await
    }

    async fn update_criterion(
        &self,
        id: i64,
        req: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>> {
        self.update_criterion_impl(id, req).await
    }

    async fn remove_criterion(&self, id: i64) -> Result<CriterionRemoval> {
        self.remove_criterion_impl(id).await
    }

    // 评教时间窗口模块
    async fn get_schedule(&self) -> Result<EvaluationSchedule> {
        self.get_schedule_impl().await
    }

    async fn apply_schedule_action(
        &self,
        action: ScheduleAction,
        changed_by: i64,
        ip_address: Option<String>,
    ) -> Result<EvaluationSchedule> {
        self.apply_schedule_action_impl(action, changed_by, ip_address)
            .await
    }

    async fn list_schedule_audits(
        &self,
        query: ScheduleAuditQuery,
    ) -> Result<ScheduleAuditListResponse> {
        self.list_schedule_audits_impl(query).await
    }

    // 评教记录模块
    async fn submit_evaluation(&self, evaluation: NewEvaluation) -> Result<Evaluation> {
        self.submit_evaluation_impl(evaluation).await
    }

    async fn list_evaluations_with_pagination(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        self.list_evaluations_with_pagination_impl(query).await
    }

    async fn get_evaluation_detail(&self, id: i64) -> Result<Option<EvaluationDetail>> {
        self.get_evaluation_detail_impl(id).await
    }

    async fn delete_evaluation(&self, id: i64) -> Result<bool> {
        self.delete_evaluation_impl(id).await
    }

    async fn faculty_results(
        &self,
        faculty_id: i64,
        semester: Option<String>,
        academic_year: Option<String>,
    ) -> Result<FacultyResultsResponse> {
        self.faculty_results_impl(faculty_id, semester, academic_year)
            .await
    }

    async fn list_pending_evaluations(
        &self,
        user_id: i64,
        department: Option<String>,
        period: ActivePeriod,
    ) -> Result<Vec<PendingEvaluation>> {
        self.list_pending_evaluations_impl(user_id, department, period)
            .await
    }
}
