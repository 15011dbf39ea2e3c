use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::middlewares::RequireJWT;
use crate::models::auth::ChangePasswordRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::validate_password_simple;

use super::AuthService;

pub async fn handle_change_password(
    service: &AuthService,
    change: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };
    let storage = service.get_storage(request)?;

    // 缓存中的用户不含密码哈希，按库中数据校验
    let stored = match storage.get_user_by_id(user.id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found")));
        }
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    };

    if !verify_password(&change.current_password, &stored.password_hash) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "Current password is incorrect",
        )));
    }

    if change.current_password == change.new_password {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "New password must differ from the current password",
        )));
    }

    if let Err(msg) = validate_password_simple(&change.new_password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    let hash = match hash_password(&change.new_password) {
        Ok(hash) => hash,
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    };

    match storage.update_password(user.id, &hash, false).await {
        Ok(true) => {
            RequireJWT::invalidate_user(request, user.id).await;
            info!("User {} changed their password", user.login_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Password changed successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found"))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    }
}
