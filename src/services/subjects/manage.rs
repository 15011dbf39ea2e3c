use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::SubjectService;
use crate::errors::EvalSystemError;
use crate::models::subjects::requests::{CreateSubjectRequest, UpdateSubjectRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

static SUBJECT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9 -]{1,19}$").expect("Invalid subject code regex"));

/// 课程代码统一为大写
pub(crate) fn normalize_code(code: &str) -> Result<String, &'static str> {
    let code = code.trim().to_ascii_uppercase();
    if SUBJECT_CODE_RE.is_match(&code) {
        Ok(code)
    } else {
        Err("Subject code must be 2-20 letters, digits, spaces or hyphens")
    }
}

fn invalid(msg: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg))
}

fn conflict() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::SubjectAlreadyExists,
        "Subject code already exists",
    ))
}

pub async fn create_subject(
    service: &SubjectService,
    mut req: CreateSubjectRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    req.code = match normalize_code(&req.code) {
        Ok(code) => code,
        Err(msg) => return Ok(invalid(msg)),
    };
    req.name = req.name.trim().to_string();
    if req.name.is_empty() {
        return Ok(invalid("Subject name must not be empty"));
    }

    let storage = service.get_storage(request)?;
    match storage.create_subject(req).await {
        Ok(subject) => {
            info!("Subject {} created", subject.code);
            Ok(HttpResponse::Created().json(ApiResponse::success(subject, "Subject created")))
        }
        Err(EvalSystemError::Conflict(_)) => Ok(conflict()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn update_subject(
    service: &SubjectService,
    id: i64,
    mut req: UpdateSubjectRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(code) = &req.code {
        req.code = match normalize_code(code) {
            Ok(code) => Some(code),
            Err(msg) => return Ok(invalid(msg)),
        };
    }
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Ok(invalid("Subject name must not be empty"));
    }

    let storage = service.get_storage(request)?;
    match storage.update_subject(id, req).await {
        Ok(Some(subject)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(subject, "Subject updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(EvalSystemError::Conflict(_)) => Ok(conflict()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn delete_subject(
    service: &SubjectService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.delete_subject(id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Subject deleted"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" it101 ").unwrap(), "IT101");
        assert_eq!(normalize_code("CS 201-L").unwrap(), "CS 201-L");
        assert!(normalize_code("").is_err());
        assert!(normalize_code("IT_101").is_err());
    }
}
