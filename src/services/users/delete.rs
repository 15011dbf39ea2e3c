use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{SEED_ADMIN_LOGIN_ID, UserService};
use crate::middlewares::{RequestContext, RequireJWT};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn delete_user(
    service: &UserService,
    ctx: RequestContext,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if user_id == ctx.user_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        )));
    }

    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserDeleteFailed)),
    };

    if user.login_id == SEED_ADMIN_LOGIN_ID {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserDeleteFailed,
            "The built-in administrator cannot be deleted",
        )));
    }

    match storage.delete_user(user_id).await {
        Ok(true) => {
            RequireJWT::invalidate_user(request, user_id).await;
            info!("Admin {} deleted user {}", ctx.user_id, user.login_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::UserDeleteFailed)),
    }
}
