use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{NaiveDate, Utc};

use super::EvaluationService;
use super::submit::same_department;
use crate::middlewares::RequestContext;
use crate::models::evaluations::requests::ResultsParams;
use crate::models::faculties::requests::FacultyListParams;
use crate::models::faculties::responses::FacultyListResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::schedule::derive_period;
use crate::services::storage_error_response;

/// 汇总筛选条件，未指定时使用当前学期
pub(crate) fn results_filter(
    params: ResultsParams,
    today: NaiveDate,
) -> (Option<String>, Option<String>) {
    if params.semester.is_some() || params.academic_year.is_some() {
        return (
            params.semester.map(|s| s.to_string()),
            params.academic_year.map(|y| y.trim().to_string()),
        );
    }
    match derive_period(today) {
        Some(period) => (Some(period.semester.to_string()), Some(period.academic_year)),
        None => (None, None),
    }
}

fn faculty_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::FacultyNotFound,
        "Faculty not found",
    ))
}

async fn respond_results(
    service: &EvaluationService,
    faculty_id: i64,
    params: ResultsParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let today = Utc::now()
        .with_timezone(&service.get_config().local_offset())
        .date_naive();
    let (semester, academic_year) = results_filter(params, today);

    match storage.faculty_results(faculty_id, semester, academic_year).await {
        Ok(results) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            results,
            "Results retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

// 教师查看本人结果
pub async fn own_results(
    service: &EvaluationService,
    ctx: &RequestContext,
    params: ResultsParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.get_faculty_by_user_id(ctx.user_id).await {
        Ok(Some(faculty)) => respond_results(service, faculty.faculty_id, params, request).await,
        Ok(None) => Ok(faculty_not_found()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

// 院长查看本学院教师
pub async fn department_faculty(
    service: &EvaluationService,
    ctx: &RequestContext,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(department) = ctx.department.clone() else {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "No department is assigned to this account",
        )));
    };

    let storage = service.get_storage(request)?;
    let params = FacultyListParams {
        department: Some(department),
        subject: None,
    };
    match storage.list_faculties(params).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            FacultyListResponse { items },
            "Faculty retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn dean_results(
    service: &EvaluationService,
    ctx: &RequestContext,
    faculty_id: i64,
    params: ResultsParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let faculty = match storage.get_faculty_by_id(faculty_id).await {
        Ok(Some(faculty)) => faculty,
        Ok(None) => return Ok(faculty_not_found()),
        Err(e) => return Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    };

    if !same_department(ctx.department.as_deref(), &faculty) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Faculty member is not in your department",
        )));
    }

    respond_results(service, faculty_id, params, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::entities::Semester;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_to_current_period() {
        let (semester, year) = results_filter(ResultsParams::default(), date(2026, 2, 1));
        assert_eq!(semester.as_deref(), Some("2nd Semester"));
        assert_eq!(year.as_deref(), Some("2025-2026"));
    }

    #[test]
    fn test_explicit_filter_wins() {
        let params = ResultsParams {
            semester: Some(Semester::First),
            academic_year: None,
        };
        let (semester, year) = results_filter(params, date(2026, 2, 1));
        assert_eq!(semester.as_deref(), Some("1st Semester"));
        assert_eq!(year, None);
    }

    #[test]
    fn test_july_aggregates_everything() {
        assert_eq!(
            results_filter(ResultsParams::default(), date(2026, 7, 20)),
            (None, None)
        );
    }
}
