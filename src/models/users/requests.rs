use super::entities::{Gender, UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub department: Option<String>,
    pub search: Option<String>,
}

/// 管理员创建用户请求
///
/// 角色相关字段按 `role` 取用：学生需要 `gender`，教师可带 `subject_ids`，
/// 管理员需要显式的 `login_id`。其余角色的登录编号由系统按序生成。
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreateUserRequest {
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    /// 不提供则生成临时密码
    pub password: Option<String>,
    pub login_id: Option<String>,
    pub gender: Option<Gender>,
    pub program: Option<String>,
    pub year_level: Option<i32>,
    pub section: Option<String>,
    pub position: Option<String>,
    pub subject_ids: Option<Vec<i64>>,
}

// 用户更新请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub status: Option<UserStatus>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub department: Option<String>,
    pub search: Option<String>,
}

/// 存储层使用的新账号描述，密码已完成哈希
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub password_hash: String,
    pub must_change_password: bool,
    pub record: NewRoleRecord,
}

/// 新账号的角色档案，决定登录编号的来源
#[derive(Debug, Clone)]
pub enum NewRoleRecord {
    Student {
        gender: Gender,
        program: Option<String>,
        year_level: Option<i32>,
        section: Option<String>,
    },
    Faculty {
        position: Option<String>,
        subject_ids: Vec<i64>,
    },
    Dean,
    Admin {
        login_id: String,
    },
}

impl NewRoleRecord {
    pub fn role(&self) -> UserRole {
        match self {
            NewRoleRecord::Student { .. } => UserRole::Student,
            NewRoleRecord::Faculty { .. } => UserRole::Faculty,
            NewRoleRecord::Dean => UserRole::Dean,
            NewRoleRecord::Admin { .. } => UserRole::Admin,
        }
    }
}
