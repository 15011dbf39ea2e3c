use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::middlewares::{RequestContext, RequireJWT};
use crate::models::users::responses::PasswordResetResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;
use crate::utils::password::{generate_temporary_password, hash_password};

/// 重置为临时密码，用户下次登录后必须修改
pub async fn reset_password(
    service: &UserService,
    ctx: RequestContext,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    };

    let temporary_password = generate_temporary_password(12);
    let hash = match hash_password(&temporary_password) {
        Ok(hash) => hash,
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    };

    match storage.update_password(user.id, &hash, true).await {
        Ok(true) => {
            RequireJWT::invalidate_user(request, user.id).await;
            info!("Admin {} reset the password of {}", ctx.user_id, user.login_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                PasswordResetResponse {
                    user_id: user.id,
                    login_id: user.login_id,
                    temporary_password,
                },
                "Password reset successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    }
}
