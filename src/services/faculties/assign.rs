use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::FacultyService;
use crate::errors::EvalSystemError;
use crate::models::faculties::requests::AssignSubjectsRequest;
use crate::models::faculties::responses::FacultySubjectsResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn assign_subjects(
    service: &FacultyService,
    faculty_id: i64,
    req: AssignSubjectsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let mut subject_ids = req.subject_ids;
    subject_ids.sort_unstable();
    subject_ids.dedup();

    if subject_ids.iter().any(|id| *id <= 0) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Subject ids must be positive integers",
        )));
    }

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

    match storage.assign_faculty_subjects(faculty_id, subject_ids).await {
        Ok(subjects) => {
            info!(
                "Faculty {} assigned {} subject(s)",
                faculty_id,
                subjects.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                FacultySubjectsResponse {
                    faculty_id,
                    subjects,
                },
                "Subjects assigned",
            )))
        }
        // 教师已确认存在，此处只可能是课程缺失
        Err(EvalSystemError::NotFound(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::SubjectNotFound, msg))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
