use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（分配登录编号、写入角色档案，单个事务）
    async fn create_user(&self, user: NewUser) -> Result<(User, RoleProfile)>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过登录编号或邮箱获取用户信息
    async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>>;
    // 获取用户的角色档案
    async fn get_role_profile(&self, user_id: i64, role: UserRole) -> Result<RoleProfile>;
    // 获取学生档案
    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<StudentProfile>>;
    // 获取教师摘要
    async fn get_faculty_by_user_id(&self, user_id: i64) -> Result<Option<FacultySummary>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 更新密码
    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 课程管理方法
    async fn list_subjects(&self, params: SubjectListParams) -> Result<Vec<Subject>>;
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject>;
    async fn update_subject(&self, id: i64, req: UpdateSubjectRequest) -> Result<Option<Subject>>;
    async fn delete_subject(&self, id: i64) -> Result<bool>;

    /// 教师管理方法
    async fn list_faculties(&self, params: FacultyListParams) -> Result<Vec<FacultySummary>>;
    async fn get_faculty_by_id(&self, faculty_id: i64) -> Result<Option<FacultySummary>>;
    async fn list_faculty_subjects(&self, faculty_id: i64) -> Result<Vec<Subject>>;
    // 教师是否讲授该课程（按课程代码）
    async fn faculty_teaches_subject(&self, faculty_id: i64, subject_code: &str) -> Result<bool>;
    // 整体替换教师的授课课程
    async fn assign_faculty_subjects(
        &self,
        faculty_id: i64,
        subject_ids: Vec<i64>,
    ) -> Result<Vec<Subject>>;

    /// 评教指标方法
    async fn list_criteria(&self, include_inactive: bool) -> Result<Vec<Criterion>>;
    async fn create_criterion(&self, req: CreateCriterionRequest) -> Result<Criterion>;
    async fn update_criterion(
        &self,
        id: i64,
        req: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>>;
    // 已被引用的指标只停用不删除
    async fn remove_criterion(&self, id: i64) -> Result<CriterionRemoval>;

    /// 评教时间窗口方法
    // 获取窗口设置，不存在时创建
    async fn get_schedule(&self) -> Result<EvaluationSchedule>;
    // 在事务内对当前窗口执行操作并写入审计日志
    async fn apply_schedule_action(
        &self,
        action: ScheduleAction,
        changed_by: i64,
        ip_address: Option<String>,
    ) -> Result<EvaluationSchedule>;
    async fn list_schedule_audits(
        &self,
        query: ScheduleAuditQuery,
    ) -> Result<ScheduleAuditListResponse>;

    /// 评教记录方法
    // 提交评教（重复检查与写入在同一事务内）
    async fn submit_evaluation(&self, evaluation: NewEvaluation) -> Result<Evaluation>;
    async fn list_evaluations_with_pagination(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse>;
    async fn get_evaluation_detail(&self, id: i64) -> Result<Option<EvaluationDetail>>;
    async fn delete_evaluation(&self, id: i64) -> Result<bool>;
    // 教师评教结果汇总
    async fn faculty_results(
        &self,
        faculty_id: i64,
        semester: Option<String>,
        academic_year: Option<String>,
    ) -> Result<FacultyResultsResponse>;
    // 学生在当前学期尚未评教的教师与课程
    async fn list_pending_evaluations(
        &self,
        user_id: i64,
        department: Option<String>,
        period: ActivePeriod,
    ) -> Result<Vec<PendingEvaluation>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
