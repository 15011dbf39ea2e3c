pub mod auth;
pub mod criteria;
pub mod evaluations;
pub mod faculties;
pub mod schedule;
pub mod subjects;
pub mod users;

pub use auth::AuthService;
pub use criteria::CriteriaService;
pub use evaluations::EvaluationService;
pub use faculties::FacultyService;
pub use schedule::ScheduleService;
pub use subjects::SubjectService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, error::ErrorInternalServerError};
use std::sync::Arc;
use tracing::error;

use crate::errors::EvalSystemError;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 从 app data 取得存储句柄
pub(crate) fn storage_from_request(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            ErrorInternalServerError("Storage not configured")
        })
}

/// 客户端地址，写入审计日志
pub(crate) fn client_ip(request: &HttpRequest) -> Option<String> {
    request
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string())
}

/// 存储层错误到 HTTP 响应的统一映射
///
/// `fallback` 用于数据库等内部错误的业务码。
pub(crate) fn storage_error_response(err: &EvalSystemError, fallback: ErrorCode) -> HttpResponse {
    match err {
        EvalSystemError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg.clone())),
        EvalSystemError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::NotFound, msg.clone())),
        EvalSystemError::Authentication(msg) => HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::Unauthorized, msg.clone())),
        EvalSystemError::Authorization(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::Forbidden, msg.clone())),
        EvalSystemError::Conflict(msg) => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::UserAlreadyExists, msg.clone())),
        EvalSystemError::DuplicateEvaluation(msg) => HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::EvaluationAlreadySubmitted, msg.clone()),
        ),
        EvalSystemError::AdmissionDenied(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::EvaluationClosed, msg.clone())),
        EvalSystemError::IdSequenceExhausted(msg) => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::IdSequenceExhausted, msg.clone()),
        ),
        other => {
            error!("Internal error: {}", other);
            HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(fallback, "Internal server error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (EvalSystemError::validation("x"), StatusCode::BAD_REQUEST),
            (EvalSystemError::not_found("x"), StatusCode::NOT_FOUND),
            (EvalSystemError::conflict("x"), StatusCode::CONFLICT),
            (EvalSystemError::duplicate_evaluation("x"), StatusCode::CONFLICT),
            (EvalSystemError::admission_denied("x"), StatusCode::FORBIDDEN),
            (
                EvalSystemError::database_operation("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let resp = storage_error_response(&err, ErrorCode::InternalServerError);
            assert_eq!(resp.status(), status, "{err}");
        }
    }
}
