use super::entities::{RoleProfile, User};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 用户响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserResponse {
    pub user: User,
    pub profile: RoleProfile,
}

// 用户列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub pagination: PaginationInfo,
}

// 创建用户响应，临时密码只返回这一次
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreatedUserResponse {
    pub user: User,
    pub profile: RoleProfile,
    pub temporary_password: Option<String>,
}

// 重置密码响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct PasswordResetResponse {
    pub user_id: i64,
    pub login_id: String,
    pub temporary_password: String,
}
