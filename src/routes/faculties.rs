use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::faculties::requests::{AssignSubjectsRequest, FacultyListParams};
use crate::models::users::entities::UserRole;
use crate::services::FacultyService;
use crate::utils::SafeIDI64;

static FACULTY_SERVICE: Lazy<FacultyService> = Lazy::new(FacultyService::new_lazy);

pub async fn list_faculties(
    req: HttpRequest,
    query: web::Query<FacultyListParams>,
) -> ActixResult<HttpResponse> {
    FACULTY_SERVICE.list_faculties(query.into_inner(), &req).await
}

pub async fn list_subjects(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    FACULTY_SERVICE.list_subjects(id.0, &req).await
}

pub async fn assign_subjects(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<AssignSubjectsRequest>,
) -> ActixResult<HttpResponse> {
    FACULTY_SERVICE
        .assign_subjects(id.0, data.into_inner(), &req)
        .await
}

pub fn configure_faculty_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/faculties")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
                    .route("", web::get().to(list_faculties))
                    .route("/{id}/subjects", web::get().to(list_subjects)),
            ),
    )
    .service(
        web::scope("/api/v1/admin/faculties")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("/{id}/subjects", web::put().to(assign_subjects)),
            ),
    );
}
