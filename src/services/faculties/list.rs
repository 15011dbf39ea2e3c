use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FacultyService;
use crate::models::faculties::requests::FacultyListParams;
use crate::models::faculties::responses::{FacultyListResponse, FacultySubjectsResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn list_faculties(
    service: &FacultyService,
    mut params: FacultyListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 课程代码按大写存储
    params.subject = params
        .subject
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty());

    let storage = service.get_storage(request)?;
    match storage.list_faculties(params).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            FacultyListResponse { items },
            "Faculty retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn list_faculty_subjects(
    service: &FacultyService,
    faculty_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_faculty_by_id(faculty_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::FacultyNotFound,
                "Faculty not found",
            )));
        }
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }

    match storage.list_faculty_subjects(faculty_id).await {
        Ok(subjects) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            FacultySubjectsResponse {
                faculty_id,
                subjects,
            },
            "Subjects retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
