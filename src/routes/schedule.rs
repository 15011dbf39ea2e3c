use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequestContext};
use crate::models::schedule::requests::{ScheduleAction, ScheduleAuditQuery};
use crate::models::users::entities::UserRole;
use crate::services::ScheduleService;

static SCHEDULE_SERVICE: Lazy<ScheduleService> = Lazy::new(ScheduleService::new_lazy);

pub async fn get_status(req: HttpRequest) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.get_status(&req).await
}

pub async fn apply_action(
    req: HttpRequest,
    ctx: RequestContext,
    action: web::Json<ScheduleAction>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.apply(ctx, action.into_inner(), &req).await
}

pub async fn list_audits(
    req: HttpRequest,
    query: web::Query<ScheduleAuditQuery>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.list_audits(query.into_inner(), &req).await
}

pub fn configure_schedule_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/evaluation-schedule")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
                    .route("", web::get().to(get_status)),
            ),
    )
    .service(
        web::scope("/api/v1/admin/evaluation-schedule")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::get().to(get_status))
                    .route("", web::post().to(apply_action))
                    .route("/audits", web::get().to(list_audits)),
            ),
    );
}
