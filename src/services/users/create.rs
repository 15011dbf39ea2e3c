use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::UserService;
use crate::errors::EvalSystemError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::UserRole,
        requests::{CreateUserRequest, NewRoleRecord, NewUser},
        responses::CreatedUserResponse,
    },
};
use crate::services::storage_error_response;
use crate::utils::password::{generate_temporary_password, hash_password};
use crate::utils::validate::{
    validate_admin_login_id, validate_email, validate_password_simple, validate_person_name,
};

const TEMPORARY_PASSWORD_LENGTH: usize = 12;

/// 校验请求并构造角色档案
pub(crate) fn build_role_record(req: &CreateUserRequest) -> Result<NewRoleRecord, (ErrorCode, String)> {
    let invalid = |msg: &str| (ErrorCode::BadRequest, msg.to_string());

    validate_person_name(&req.first_name).map_err(invalid)?;
    validate_person_name(&req.last_name).map_err(invalid)?;
    if let Some(email) = req.email.as_deref().filter(|e| !e.trim().is_empty()) {
        validate_email(email.trim()).map_err(|m| (ErrorCode::UserEmailInvalid, m.to_string()))?;
    }
    if let Some(password) = &req.password {
        validate_password_simple(password).map_err(|m| (ErrorCode::UserPasswordInvalid, m))?;
    }

    match req.role {
        UserRole::Student => {
            let gender = req
                .gender
                .ok_or_else(|| invalid("Gender is required for student accounts"))?;
            if let Some(level) = req.year_level
                && !(1..=6).contains(&level)
            {
                return Err(invalid("Year level must be between 1 and 6"));
            }
            Ok(NewRoleRecord::Student {
                gender,
                program: req.program.clone(),
                year_level: req.year_level,
                section: req.section.clone(),
            })
        }
        UserRole::Faculty => {
            let mut subject_ids = req.subject_ids.clone().unwrap_or_default();
            subject_ids.sort_unstable();
            subject_ids.dedup();
            Ok(NewRoleRecord::Faculty {
                position: req.position.clone(),
                subject_ids,
            })
        }
        UserRole::Dean => Ok(NewRoleRecord::Dean),
        UserRole::Admin => {
            let login_id = req
                .login_id
                .as_deref()
                .map(str::trim)
                .ok_or_else(|| invalid("Login id is required for admin accounts"))?;
            validate_admin_login_id(login_id).map_err(invalid)?;
            Ok(NewRoleRecord::Admin {
                login_id: login_id.to_string(),
            })
        }
    }
}

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let record = match build_role_record(&user_data) {
        Ok(record) => record,
        Err((code, msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
        }
    };

    // 未提供密码时生成临时密码，只在本次响应中返回
    let (password, temporary_password) = match user_data.password {
        Some(password) => (password, None),
        None => {
            let generated = generate_temporary_password(TEMPORARY_PASSWORD_LENGTH);
            (generated.clone(), Some(generated))
        }
    };
    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserCreationFailed,
                    "Password hashing failed",
                )),
            );
        }
    };

    let new_user = NewUser {
        first_name: user_data.first_name.trim().to_string(),
        last_name: user_data.last_name.trim().to_string(),
        email: user_data
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        department: user_data
            .department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        password_hash,
        must_change_password: true,
        record,
    };

    let storage = service.get_storage(request)?;
    match storage.create_user(new_user).await {
        Ok((user, profile)) => {
            info!("Admin created {} account {}", user.role, user.login_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                CreatedUserResponse {
                    user,
                    profile,
                    temporary_password,
                },
                "User created successfully",
            )))
        }
        Err(EvalSystemError::NotFound(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::SubjectNotFound, msg))),
        Err(EvalSystemError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Login id or email already exists",
            ),
        )),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::UserCreationFailed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::Gender;

    fn request(role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            role,
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: None,
            department: Some("CCS".to_string()),
            password: None,
            login_id: None,
            gender: None,
            program: None,
            year_level: None,
            section: None,
            position: None,
            subject_ids: None,
        }
    }

    #[test]
    fn test_student_requires_gender() {
        assert!(build_role_record(&request(UserRole::Student)).is_err());

        let mut req = request(UserRole::Student);
        req.gender = Some(Gender::Male);
        assert!(matches!(
            build_role_record(&req),
            Ok(NewRoleRecord::Student {
                gender: Gender::Male,
                ..
            })
        ));
    }

    #[test]
    fn test_admin_requires_valid_login_id() {
        assert!(build_role_record(&request(UserRole::Admin)).is_err());

        let mut req = request(UserRole::Admin);
        req.login_id = Some("F-001".to_string());
        assert!(build_role_record(&req).is_err());

        req.login_id = Some(" registrar ".to_string());
        assert!(matches!(
            build_role_record(&req),
            Ok(NewRoleRecord::Admin { login_id }) if login_id == "registrar"
        ));
    }

    #[test]
    fn test_faculty_subjects_are_deduplicated() {
        let mut req = request(UserRole::Faculty);
        req.subject_ids = Some(vec![3, 1, 3]);
        match build_role_record(&req) {
            Ok(NewRoleRecord::Faculty { subject_ids, .. }) => assert_eq!(subject_ids, vec![1, 3]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_weak_password_and_bad_email() {
        let mut req = request(UserRole::Dean);
        req.password = Some("short".to_string());
        assert_eq!(
            build_role_record(&req).unwrap_err().0,
            ErrorCode::UserPasswordInvalid
        );

        let mut req = request(UserRole::Dean);
        req.email = Some("not-an-email".to_string());
        assert_eq!(build_role_record(&req).unwrap_err().0, ErrorCode::UserEmailInvalid);
    }
}
