use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequestContext};
use crate::models::criteria::requests::{
    CreateCriterionRequest, CriteriaListParams, UpdateCriterionRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::CriteriaService;
use crate::utils::SafeIDI64;

static CRITERIA_SERVICE: Lazy<CriteriaService> = Lazy::new(CriteriaService::new_lazy);

pub async fn list_criteria(
    req: HttpRequest,
    ctx: RequestContext,
    query: web::Query<CriteriaListParams>,
) -> ActixResult<HttpResponse> {
    CRITERIA_SERVICE
        .list_criteria(&ctx, query.into_inner(), &req)
        .await
}

pub async fn create_criterion(
    req: HttpRequest,
    data: web::Json<CreateCriterionRequest>,
) -> ActixResult<HttpResponse> {
    CRITERIA_SERVICE.create_criterion(data.into_inner(), &req).await
}

pub async fn update_criterion(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<UpdateCriterionRequest>,
) -> ActixResult<HttpResponse> {
    CRITERIA_SERVICE
        .update_criterion(id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_criterion(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    CRITERIA_SERVICE.delete_criterion(id.0, &req).await
}

pub fn configure_criteria_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/criteria")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
                    .route("", web::get().to(list_criteria)),
            ),
    )
    .service(
        web::scope("/api/v1/admin/criteria")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::post().to(create_criterion))
                    .route("/{id}", web::put().to(update_criterion))
                    .route("/{id}", web::delete().to(delete_criterion)),
            ),
    );
}
