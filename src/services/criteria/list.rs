use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CriteriaService;
use crate::middlewares::RequestContext;
use crate::models::criteria::requests::CriteriaListParams;
use crate::models::criteria::responses::CriteriaListResponse;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

pub async fn list_criteria(
    service: &CriteriaService,
    ctx: &RequestContext,
    params: CriteriaListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 停用的指标只对管理员可见
    let include_inactive = params.include_inactive && ctx.role == UserRole::Admin;

    let storage = service.get_storage(request)?;
    match storage.list_criteria(include_inactive).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CriteriaListResponse { items },
            "Criteria retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}
