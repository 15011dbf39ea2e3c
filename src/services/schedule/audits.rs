use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ScheduleService;
use crate::models::schedule::requests::ScheduleAuditQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn list_audits(
    service: &ScheduleService,
    query: ScheduleAuditQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_schedule_audits(query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            list,
            "Schedule audit log retrieved",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
