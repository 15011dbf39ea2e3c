use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::EvaluationService;
use crate::middlewares::RequestContext;
use crate::models::evaluations::requests::EvaluationListQuery;
use crate::models::evaluations::responses::PendingEvaluationsResponse;
use crate::models::{ApiResponse, ErrorCode, PaginationQuery};
use crate::services::schedule::derive_period;
use crate::services::storage_error_response;

// 本学期尚未评教的教师与课程
pub async fn list_pending(
    service: &EvaluationService,
    ctx: &RequestContext,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let offset = service.get_config().local_offset();
    let today = Utc::now().with_timezone(&offset).date_naive();

    let Some(period) = derive_period(today) else {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            PendingEvaluationsResponse {
                period: None,
                items: Vec::new(),
            },
            "No academic period is active for the current date",
        )));
    };

    match storage
        .list_pending_evaluations(ctx.user_id, ctx.department.clone(), period.clone())
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            PendingEvaluationsResponse {
                period: Some(period),
                items,
            },
            "Pending evaluations retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

// 本人提交过的评教
pub async fn list_own(
    service: &EvaluationService,
    ctx: &RequestContext,
    pagination: PaginationQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let query = EvaluationListQuery {
        page: Some(pagination.page),
        size: Some(pagination.size),
        evaluator_user_id: Some(ctx.user_id),
        evaluator_role: Some(ctx.role),
        ..Default::default()
    };

    match storage.list_evaluations_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Evaluations retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
