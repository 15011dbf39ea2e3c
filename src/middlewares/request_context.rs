//! 请求级身份上下文
//!
//! 由 `RequireJWT` 写入请求扩展，处理函数通过提取器取用。

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

use super::create_error_response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub role: UserRole,
    pub department: Option<String>,
    pub must_change_password: bool,
}

impl RequestContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            department: user.department.clone(),
            must_change_password: user.must_change_password,
        }
    }

    pub fn current(req: &HttpRequest) -> Option<Self> {
        req.extensions().get::<RequestContext>().cloned()
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(RequestContext::current(req).ok_or_else(|| {
            InternalError::from_response(
                "missing request context",
                create_error_response(
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    ErrorCode::Unauthorized,
                    "Authentication required",
                ),
            )
            .into()
        }))
    }
}
