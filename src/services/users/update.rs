use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::errors::EvalSystemError;
use crate::middlewares::{RequestContext, RequireJWT};
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserStatus, requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::storage_error_response;
use crate::utils::validate::{validate_email, validate_person_name};

fn validate_update(update: &UpdateUserRequest) -> Result<(), (ErrorCode, &'static str)> {
    for name in [&update.first_name, &update.last_name].into_iter().flatten() {
        validate_person_name(name).map_err(|m| (ErrorCode::BadRequest, m))?;
    }
    // 空字符串表示清除邮箱
    if let Some(email) = update.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        validate_email(email).map_err(|m| (ErrorCode::UserEmailInvalid, m))?;
    }
    Ok(())
}

pub async fn update_user(
    service: &UserService,
    ctx: RequestContext,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err((code, msg)) = validate_update(&update_data) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
    }

    if user_id == ctx.user_id && update_data.status == Some(UserStatus::Inactive) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserUpdateFailed,
            "You cannot deactivate your own account",
        )));
    }

    let storage = service.get_storage(request)?;
    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            RequireJWT::invalidate_user(request, user.id).await;
            let profile = match storage.get_role_profile(user.id, user.role).await {
                Ok(profile) => profile,
                Err(e) => return Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user, profile },
                "User information updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(EvalSystemError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Email is already in use"),
        )),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::UserUpdateFailed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_update() {
        assert!(validate_update(&UpdateUserRequest::default()).is_ok());

        let clear_email = UpdateUserRequest {
            email: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_update(&clear_email).is_ok());

        let bad_email = UpdateUserRequest {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_update(&bad_email).unwrap_err().0, ErrorCode::UserEmailInvalid);

        let blank_name = UpdateUserRequest {
            last_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_update(&blank_name).is_err());
    }
}
