/*!
 * CSRF 校验中间件
 *
 * 对写请求校验 `X-CSRF-Token` 头，令牌由 `GET /api/v1/auth/csrf` 签发并绑定当前用户。
 * 必须在 `RequireJWT` 之后执行。`csrf.enabled = false` 时直接放行。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::warn;

use crate::config::AppConfig;
use crate::middlewares::RequestContext;
use crate::models::ErrorCode;
use crate::utils::csrf::{CSRF_HEADER, CsrfSigner};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireCsrf {
    enabled: bool,
    signer: CsrfSigner,
}

impl RequireCsrf {
    pub fn from_config() -> Self {
        Self {
            enabled: AppConfig::get().csrf.enabled,
            signer: CsrfSigner::from_config(),
        }
    }
}

/// 只读方法不需要令牌
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl<S, B> Transform<S, ServiceRequest> for RequireCsrf
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireCsrfMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireCsrfMiddleware {
            service: Rc::new(service),
            enabled: self.enabled,
            signer: self.signer.clone(),
        }))
    }
}

pub struct RequireCsrfMiddleware<S> {
    service: Rc<S>,
    enabled: bool,
    signer: CsrfSigner,
}

impl<S, B> Service<ServiceRequest> for RequireCsrfMiddleware<S>
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
        let enabled = self.enabled;
        let signer = self.signer.clone();

        Box::pin(async move {
            if !enabled || is_safe_method(req.method()) {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            let Some(context) = RequestContext::current(req.request()) else {
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            let valid = req
                .headers()
                .get(CSRF_HEADER)
                .and_then(|h| h.to_str().ok())
                .is_some_and(|token| signer.verify(token, context.user_id, chrono::Utc::now()));

            if valid {
                Ok(srv.call(req).await?.map_into_left_body())
            } else {
                warn!(
                    "CSRF validation failed for user {} on {} {}",
                    context.user_id,
                    req.method(),
                    req.path()
                );
                Ok(req.into_response(
                    create_error_response(
                        StatusCode::FORBIDDEN,
                        ErrorCode::CsrfTokenInvalid,
                        "Missing or invalid CSRF token",
                    )
                    .map_into_right_body(),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
        assert!(!is_safe_method(&Method::PUT));
    }
}
