/*!
 * JWT 认证中间件
 *
 * 验证 `Authorization: Bearer <token>`，通过后把 `User` 与 `RequestContext`
 * 写入请求扩展。
 *
 * ```rust,ignore
 * web::scope("/api/v1/student")
 *     .wrap(RequireRole::new_any(UserRole::student_roles()))
 *     .wrap(RequireJWT)
 * ```
 *
 * actix 的 `wrap` 后注册的先执行，因此 `RequireJWT` 写在最后。
 *
 * ## 缓存
 *
 * 用户信息按 `user:{id}` 缓存。修改密码、更新或删除用户后调用
 * [`RequireJWT::invalidate_user`]，下一次请求会重新读库并检查账号状态。
 */

use crate::cache::{CacheResult, ObjectCache, user_cache_key};
use crate::config::AppConfig;
use crate::middlewares::RequestContext;
use crate::models::users::entities::{User, UserRole, UserStatus};
use crate::models::ErrorCode;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

enum JwtFailure {
    Unauthorized(String),
    Misconfigured(&'static str),
}

// 提取并验证 access token，返回对应的有效用户
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, JwtFailure> {
    let token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| JwtFailure::Unauthorized("Missing or invalid Authorization header".into()))?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        JwtFailure::Unauthorized("Invalid JWT token".into())
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| JwtFailure::Unauthorized("Invalid user ID in JWT".into()))?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(JwtFailure::Misconfigured("Cache not found in app data"))?;

    let key = user_cache_key(user_id);
    match cache.get_raw(&key).await {
        CacheResult::Found(json) => match serde_json::from_str::<User>(&json) {
            Ok(user) => return Ok(user),
            Err(_) => {
                cache.remove(&key).await;
                info!("Failed to deserialize cached user {}", user_id);
            }
        },
        CacheResult::NotFound => {
            debug!("User {} not found in cache", user_id);
        }
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(JwtFailure::Misconfigured("Storage not found in app data"))?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to retrieve user {} from storage: {}", user_id, e);
            JwtFailure::Unauthorized("Failed to retrieve user".into())
        })?
        .ok_or_else(|| JwtFailure::Unauthorized("User not found".into()))?;

    if user.status != UserStatus::Active {
        return Err(JwtFailure::Unauthorized("User is not active".into()));
    }

    // 密码哈希不参与序列化，缓存中不会落地
    if let Ok(user_json) = serde_json::to_string(&user) {
        cache
            .insert_raw(key, user_json, AppConfig::get().cache.default_ttl)
            .await;
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // 预检请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    let context = RequestContext::from_user(&user);
                    req.extensions_mut().insert(context);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(JwtFailure::Unauthorized(err)) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
                Err(JwtFailure::Misconfigured(err)) => {
                    error!("RequireJWT misconfigured: {}", err);
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            ErrorCode::InternalServerError,
                            "Internal server error",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 从请求扩展中提取当前用户
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }

    /// 清除用户缓存
    pub async fn invalidate_user(req: &HttpRequest, user_id: i64) {
        if let Some(cache) = req.app_data::<web::Data<Arc<dyn ObjectCache>>>() {
            cache.remove(&user_cache_key(user_id)).await;
            debug!("Invalidated cached user {}", user_id);
        }
    }
}
