use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::EvaluationService;
use crate::models::evaluations::requests::{EvaluationListParams, EvaluationListQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::EvaluationNotFound,
        "Evaluation not found",
    ))
}

pub async fn list_evaluations(
    service: &EvaluationService,
    params: EvaluationListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let query = EvaluationListQuery {
        page: params.page,
        size: params.size,
        faculty_id: params.faculty_id,
        subject: params.subject.map(|s| s.trim().to_ascii_uppercase()),
        semester: params.semester,
        academic_year: params.academic_year,
        evaluator_role: params.evaluator_role,
        evaluator_user_id: None,
    };

    match storage.list_evaluations_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Evaluations retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn get_evaluation(
    service: &EvaluationService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.get_evaluation_detail(id).await {
        Ok(Some(detail)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Evaluation retrieved successfully",
        ))),
        Ok(None) => Ok(not_found()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn delete_evaluation(
    service: &EvaluationService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.delete_evaluation(id).await {
        Ok(true) => {
            info!("Evaluation {} deleted", id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Evaluation deleted")))
        }
        Ok(false) => Ok(not_found()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
