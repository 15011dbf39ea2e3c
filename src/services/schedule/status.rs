use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::ScheduleService;
use super::admission::check_admission;
use crate::models::schedule::responses::ScheduleStatusResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn get_status(
    service: &ScheduleService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let now = Utc::now();

    match storage.get_schedule().await {
        Ok(schedule) => {
            let offset = service.get_config().local_offset();
            let admission = check_admission(&schedule, &now.with_timezone(&offset));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                ScheduleStatusResponse {
                    schedule,
                    admission,
                    server_time: now,
                },
                "Evaluation schedule retrieved",
            )))
        }
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
