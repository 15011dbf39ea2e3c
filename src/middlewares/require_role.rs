/*!
 * 基于角色的访问控制中间件
 *
 * 必须在 `RequireJWT` 之后执行。
 *
 * - 无身份：401
 * - 角色不符：403
 * - 待修改初始密码：403 (`PasswordChangeRequired`)，认证路由不挂此中间件，
 *   以便用户修改密码
 *
 * ```rust,ignore
 * web::scope("/api/v1/admin")
 *     .wrap(RequireJWT)
 *     .service(
 *         web::scope("")
 *             .wrap(RequireRole::new_any(UserRole::admin_roles()))
 *             .route("/users", web::get().to(list_users)),
 *     )
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::{
    middlewares::RequestContext,
    models::{ErrorCode, users::entities::UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    required_roles: Vec<UserRole>,
}

impl RequireRole {
    /// 创建需要任一角色的中间件
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            required_roles: roles.iter().map(|r| **r).collect(),
        }
    }
}

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: &'static str,
}

pub fn authorize(context: Option<&RequestContext>, required_roles: &[UserRole]) -> Result<(), Denial> {
    let Some(context) = context else {
        return Err(Denial {
            status: StatusCode::UNAUTHORIZED,
            code: ErrorCode::Unauthorized,
            message: "Authentication required",
        });
    };

    if !required_roles.contains(&context.role) {
        return Err(Denial {
            status: StatusCode::FORBIDDEN,
            code: ErrorCode::Forbidden,
            message: "Access denied.",
        });
    }

    if context.must_change_password {
        return Err(Denial {
            status: StatusCode::FORBIDDEN,
            code: ErrorCode::PasswordChangeRequired,
            message: "Password change required before continuing",
        });
    }

    Ok(())
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            required_roles: self.required_roles.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    required_roles: Vec<UserRole>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required_roles = self.required_roles.clone();

        Box::pin(async move {
            let context = RequestContext::current(req.request());

            match authorize(context.as_ref(), &required_roles) {
                Ok(()) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(denial) => {
                    info!(
                        "Access denied for {:?} on {}: {} (required roles: {:?})",
                        context.as_ref().map(|c| c.user_id),
                        req.path(),
                        denial.message,
                        required_roles
                    );
                    Ok(req.into_response(
                        create_error_response(denial.status, denial.code, denial.message)
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: UserRole, must_change_password: bool) -> RequestContext {
        RequestContext {
            user_id: 7,
            role,
            department: Some("CCS".to_string()),
            must_change_password,
        }
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let denial = authorize(None, &[UserRole::Admin]).unwrap_err();
        assert_eq!(denial.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let ctx = context(UserRole::Student, false);
        let denial = authorize(Some(&ctx), &[UserRole::Dean]).unwrap_err();
        assert_eq!(denial.status, StatusCode::FORBIDDEN);
        assert_eq!(denial.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_pending_password_change_is_forbidden() {
        let ctx = context(UserRole::Dean, true);
        let denial = authorize(Some(&ctx), &[UserRole::Dean]).unwrap_err();
        assert_eq!(denial.code, ErrorCode::PasswordChangeRequired);
    }

    #[test]
    fn test_matching_role_passes() {
        let ctx = context(UserRole::Faculty, false);
        assert!(authorize(Some(&ctx), &[UserRole::Faculty, UserRole::Dean]).is_ok());
    }
}
