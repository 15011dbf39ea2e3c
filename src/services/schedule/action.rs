use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::info;

use super::ScheduleService;
use super::admission::check_admission;
use crate::errors::EvalSystemError;
use crate::middlewares::RequestContext;
use crate::models::schedule::requests::ScheduleAction;
use crate::models::schedule::responses::ScheduleStatusResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{client_ip, storage_error_response};

/// 操作在存储事务内作用于最新的窗口行
pub async fn handle_action(
    service: &ScheduleService,
    ctx: RequestContext,
    action: ScheduleAction,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let action_name = action.name();

    match storage
        .apply_schedule_action(action, ctx.user_id, client_ip(request))
        .await
    {
        Ok(saved) => {
            info!(
                "Evaluation schedule changed by {}: {} (mode: {})",
                ctx.user_id, action_name, saved.override_mode
            );
            let now = Utc::now();
            let offset = service.get_config().local_offset();
            let admission = check_admission(&saved, &now.with_timezone(&offset));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                ScheduleStatusResponse {
                    schedule: saved,
                    admission,
                    server_time: now,
                },
                "Evaluation schedule updated",
            )))
        }
        Err(EvalSystemError::Validation(msg)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::ScheduleInvalid, msg),
        )),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
