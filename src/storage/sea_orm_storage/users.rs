use super::{SeaOrmStorage, id_sequence, write_error};
use crate::entity::prelude::{Deans, Faculties, FacultySubjects, Students, Subjects};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::entity::{deans, faculties, faculty_subjects, students, subjects};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    PaginationInfo,
    faculties::entities::FacultySummary,
    users::{
        entities::{RoleProfile, StudentProfile, User, UserRole, UserStatus},
        requests::{NewRoleRecord, NewUser, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::{contains_pattern, normalize_department};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

impl SeaOrmStorage {
    /// 创建用户
    ///
    /// 编号分配、用户行、角色档案和教师授课关系在同一个事务中写入，
    /// 任一步失败都会整体回滚并释放已分配的编号。
    pub async fn create_user_impl(&self, new: NewUser) -> Result<(User, RoleProfile)> {
        let now = chrono::Utc::now().timestamp();
        let role = new.record.role();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let login_id = match (&new.record, id_sequence::prefix_for(&new.record)) {
            (NewRoleRecord::Admin { login_id }, _) => login_id.clone(),
            (_, Some(prefix)) => id_sequence::claim_next_id(&txn, prefix).await?,
            (_, None) => {
                return Err(EvalSystemError::validation("Missing identifier prefix"));
            }
        };

        let user = ActiveModel {
            login_id: Set(login_id.clone()),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            role: Set(role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            department: Set(new.department.as_deref().and_then(normalize_department)),
            must_change_password: Set(new.must_change_password),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| write_error("创建用户失败", e))?;

        let profile = match new.record {
            NewRoleRecord::Student {
                gender,
                program,
                year_level,
                section,
            } => {
                let student = students::ActiveModel {
                    user_id: Set(user.id),
                    student_number: Set(login_id.clone()),
                    gender: Set(gender.to_string()),
                    program: Set(program),
                    year_level: Set(year_level),
                    section: Set(section),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| write_error("创建学生档案失败", e))?;
                RoleProfile::Student(student.into_profile())
            }
            NewRoleRecord::Faculty {
                position,
                subject_ids,
            } => {
                let faculty = faculties::ActiveModel {
                    user_id: Set(user.id),
                    employee_id: Set(login_id.clone()),
                    position: Set(position),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| write_error("创建教师档案失败", e))?;
                insert_faculty_subjects(&txn, faculty.id, &subject_ids, now).await?;
                RoleProfile::Faculty(faculty.into_profile())
            }
            NewRoleRecord::Dean => {
                let dean = deans::ActiveModel {
                    user_id: Set(user.id),
                    employee_id: Set(login_id.clone()),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| write_error("创建院长档案失败", e))?;
                RoleProfile::Dean(dean.into_profile())
            }
            NewRoleRecord::Admin { .. } => RoleProfile::Admin,
        };

        txn.commit()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("提交事务失败: {e}")))?;

        info!("Created {} account {}", role, login_id);

        Ok((user.into_user(), profile))
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过登录编号或邮箱获取用户
    pub async fn get_user_by_login_impl(&self, identifier: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(
                Condition::any()
                    .add(Column::LoginId.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 获取角色档案
    pub async fn get_role_profile_impl(&self, user_id: i64, role: UserRole) -> Result<RoleProfile> {
        let profile = match role {
            UserRole::Student => Students::find()
                .filter(students::Column::UserId.eq(user_id))
                .one(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询学生档案失败: {e}")))?
                .map(|m| RoleProfile::Student(m.into_profile())),
            UserRole::Faculty => Faculties::find()
                .filter(faculties::Column::UserId.eq(user_id))
                .one(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询教师档案失败: {e}")))?
                .map(|m| RoleProfile::Faculty(m.into_profile())),
            UserRole::Dean => Deans::find()
                .filter(deans::Column::UserId.eq(user_id))
                .one(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询院长档案失败: {e}")))?
                .map(|m| RoleProfile::Dean(m.into_profile())),
            UserRole::Admin => Some(RoleProfile::Admin),
        };

        Ok(profile.unwrap_or(RoleProfile::Missing))
    }

    pub async fn get_student_by_user_id_impl(&self, user_id: i64) -> Result<Option<StudentProfile>> {
        let result = Students::find()
            .filter(students::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询学生档案失败: {e}")))?;

        Ok(result.map(|m| m.into_profile()))
    }

    pub async fn get_faculty_by_user_id_impl(&self, user_id: i64) -> Result<Option<FacultySummary>> {
        let result = Faculties::find()
            .filter(faculties::Column::UserId.eq(user_id))
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师档案失败: {e}")))?;

        Ok(match result {
            Some((faculty, Some(user))) => Some(faculty.into_summary(user)),
            _ => None,
        })
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let (page, size) = PaginationInfo::normalize(query.page, query.size);

        let mut select = Users::find();

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = contains_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::LoginId.like(pattern.clone()))
                    .add(Column::Email.like(pattern.clone()))
                    .add(Column::FirstName.like(pattern.clone()))
                    .add(Column::LastName.like(pattern)),
            );
        }

        // 角色筛选
        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        // 状态筛选
        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(department) = query.department.as_deref().and_then(normalize_department) {
            select = select.filter(Column::Department.eq(department));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size as u64);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询用户总数失败: {e}")))?;

        let users = paginator
            .fetch_page((page - 1) as u64)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total as i64),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("更新最后登录时间失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        // 先检查用户是否存在
        let existing = self.get_user_by_id_impl(id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(email) = update.email {
            // 空字符串表示清除邮箱
            let email = email.trim().to_string();
            model.email = Set((!email.is_empty()).then_some(email));
        }

        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }

        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }

        if let Some(department) = update.department {
            model.department = Set(normalize_department(&department));
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| write_error("更新用户失败", e))?;

        self.get_user_by_id_impl(id).await
    }

    /// 更新密码哈希与强制改密标记
    pub async fn update_password_impl(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(
                Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .col_expr(
                Column::MustChangePassword,
                sea_orm::sea_query::Expr::value(must_change_password),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("更新密码失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除用户，角色档案随外键级联删除
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        let count = Users::find()
            .count(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("统计用户数量失败: {e}")))?;

        Ok(count)
    }
}

/// 写入教师授课关系，课程必须全部存在
pub(crate) async fn insert_faculty_subjects<C: ConnectionTrait>(
    conn: &C,
    faculty_id: i64,
    subject_ids: &[i64],
    now: i64,
) -> Result<()> {
    let mut ids = subject_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let found = Subjects::find()
        .filter(subjects::Column::Id.is_in(ids.clone()))
        .count(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?;
    if found != ids.len() as u64 {
        return Err(EvalSystemError::not_found("One or more subjects do not exist"));
    }

    let rows = ids.into_iter().map(|subject_id| faculty_subjects::ActiveModel {
        faculty_id: Set(faculty_id),
        subject_id: Set(subject_id),
        created_at: Set(now),
        ..Default::default()
    });
    FacultySubjects::insert_many(rows)
        .exec(conn)
        .await
        .map_err(|e| write_error("写入授课关系失败", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::Gender;
    use crate::storage::sea_orm_storage::test_support::in_memory_storage;

    fn new_user(first_name: &str, record: NewRoleRecord) -> NewUser {
        NewUser {
            first_name: first_name.to_string(),
            last_name: "Santos".to_string(),
            email: None,
            department: Some("CCS".to_string()),
            password_hash: "hash".to_string(),
            must_change_password: true,
            record,
        }
    }

    fn student(gender: Gender) -> NewRoleRecord {
        NewRoleRecord::Student {
            gender,
            program: Some("BSIT".to_string()),
            year_level: Some(2),
            section: None,
        }
    }

    #[tokio::test]
    async fn test_student_ids_follow_gender_prefix() {
        let storage = in_memory_storage().await;

        let (first, profile) = storage
            .create_user_impl(new_user("Ana", student(Gender::Female)))
            .await
            .unwrap();
        let (second, _) = storage
            .create_user_impl(new_user("Ben", student(Gender::Male)))
            .await
            .unwrap();
        let (third, _) = storage
            .create_user_impl(new_user("Cara", student(Gender::Female)))
            .await
            .unwrap();

        assert_eq!(first.login_id, "221-001");
        assert_eq!(second.login_id, "222-001");
        assert_eq!(third.login_id, "221-002");
        assert_eq!(first.role, UserRole::Student);
        match profile {
            RoleProfile::Student(p) => assert_eq!(p.student_number, "221-001"),
            other => panic!("unexpected profile: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_create_rolls_back_claimed_id() {
        let storage = in_memory_storage().await;

        // 不存在的课程导致整个事务回滚
        let err = storage
            .create_user_impl(new_user(
                "Dan",
                NewRoleRecord::Faculty {
                    position: None,
                    subject_ids: vec![404],
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::NotFound(_)));
        assert_eq!(storage.count_users_impl().await.unwrap(), 0);

        let (faculty, _) = storage
            .create_user_impl(new_user(
                "Eve",
                NewRoleRecord::Faculty {
                    position: Some("Instructor I".to_string()),
                    subject_ids: vec![],
                },
            ))
            .await
            .unwrap();
        assert_eq!(faculty.login_id, "F-001");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let storage = in_memory_storage().await;

        let mut first = new_user("Fay", NewRoleRecord::Dean);
        first.email = Some("dean@example.edu".to_string());
        storage.create_user_impl(first).await.unwrap();

        let mut second = new_user("Gil", NewRoleRecord::Dean);
        second.email = Some("dean@example.edu".to_string());
        let err = storage.create_user_impl(second).await.unwrap_err();
        assert!(matches!(err, EvalSystemError::Conflict(_)));

        // 失败的创建不消耗编号
        let (third, _) = storage
            .create_user_impl(new_user("Hal", NewRoleRecord::Dean))
            .await
            .unwrap();
        assert_eq!(third.login_id, "D-002");
    }

    #[tokio::test]
    async fn test_login_lookup_and_password_update() {
        let storage = in_memory_storage().await;

        let mut admin = new_user(
            "Root",
            NewRoleRecord::Admin {
                login_id: "admin".to_string(),
            },
        );
        admin.email = Some("admin@example.edu".to_string());
        let (created, profile) = storage.create_user_impl(admin).await.unwrap();
        assert!(matches!(profile, RoleProfile::Admin));

        let by_login = storage.get_user_by_login_impl("admin").await.unwrap();
        let by_email = storage
            .get_user_by_login_impl("admin@example.edu")
            .await
            .unwrap();
        assert_eq!(by_login.unwrap().id, created.id);
        assert_eq!(by_email.unwrap().id, created.id);

        assert!(
            storage
                .update_password_impl(created.id, "new-hash", false)
                .await
                .unwrap()
        );
        let user = storage.get_user_by_id_impl(created.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new-hash");
        assert!(!user.must_change_password);
    }

    #[tokio::test]
    async fn test_delete_cascades_role_record() {
        let storage = in_memory_storage().await;

        let (user, _) = storage
            .create_user_impl(new_user("Ivy", student(Gender::Male)))
            .await
            .unwrap();
        assert!(storage.delete_user_impl(user.id).await.unwrap());
        assert!(
            storage
                .get_student_by_user_id_impl(user.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
