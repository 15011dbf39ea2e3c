use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit, RequestContext};
use crate::models::PaginationQuery;
use crate::models::evaluations::requests::{
    EvaluationListParams, ResultsParams, SubmitEvaluationRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::EvaluationService;
use crate::services::evaluations::SubmissionKind;
use crate::utils::{SafeFacultyIdI64, SafeIDI64};

static EVALUATION_SERVICE: Lazy<EvaluationService> = Lazy::new(EvaluationService::new_lazy);

// 学生
pub async fn student_pending(req: HttpRequest, ctx: RequestContext) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE.list_pending(&ctx, &req).await
}

pub async fn student_history(
    req: HttpRequest,
    ctx: RequestContext,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .list_own(&ctx, query.into_inner(), &req)
        .await
}

pub async fn student_submit(
    req: HttpRequest,
    ctx: RequestContext,
    data: web::Json<SubmitEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .submit(&ctx, SubmissionKind::Student, data.into_inner(), &req)
        .await
}

// 教师
pub async fn faculty_self_submit(
    req: HttpRequest,
    ctx: RequestContext,
    data: web::Json<SubmitEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .submit(&ctx, SubmissionKind::FacultySelf, data.into_inner(), &req)
        .await
}

pub async fn faculty_results(
    req: HttpRequest,
    ctx: RequestContext,
    query: web::Query<ResultsParams>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .own_results(&ctx, query.into_inner(), &req)
        .await
}

// 院长
pub async fn dean_submit(
    req: HttpRequest,
    ctx: RequestContext,
    data: web::Json<SubmitEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .submit(&ctx, SubmissionKind::Dean, data.into_inner(), &req)
        .await
}

pub async fn dean_faculty(req: HttpRequest, ctx: RequestContext) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE.department_faculty(&ctx, &req).await
}

pub async fn dean_results(
    req: HttpRequest,
    ctx: RequestContext,
    faculty_id: SafeFacultyIdI64,
    query: web::Query<ResultsParams>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .dean_results(&ctx, faculty_id.0, query.into_inner(), &req)
        .await
}

// 管理员
pub async fn list_evaluations(
    req: HttpRequest,
    query: web::Query<EvaluationListParams>,
) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE
        .list_evaluations(query.into_inner(), &req)
        .await
}

pub async fn get_evaluation(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE.get_evaluation(id.0, &req).await
}

pub async fn delete_evaluation(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE.delete_evaluation(id.0, &req).await
}

pub fn configure_evaluation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/student")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route("/evaluations/pending", web::get().to(student_pending))
                    // 资源级 guard 不匹配时继续匹配下一个资源，GET 不计入限流
                    .service(
                        web::resource("/evaluations")
                            .guard(guard::Post())
                            .wrap(RateLimit::submission())
                            .route(web::post().to(student_submit)),
                    )
                    .route("/evaluations", web::get().to(student_history)),
            ),
    )
    .service(
        web::scope("/api/v1/faculty")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::faculty_roles()))
                    .service(
                        web::resource("/evaluations/self")
                            .wrap(RateLimit::submission())
                            .route(web::post().to(faculty_self_submit)),
                    )
                    .route("/results", web::get().to(faculty_results)),
            ),
    )
    .service(
        web::scope("/api/v1/dean")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::dean_roles()))
                    .service(
                        web::resource("/evaluations")
                            .wrap(RateLimit::submission())
                            .route(web::post().to(dean_submit)),
                    )
                    .route("/faculty", web::get().to(dean_faculty))
                    .route("/results/{faculty_id}", web::get().to(dean_results)),
            ),
    )
    .service(
        web::scope("/api/v1/admin/evaluations")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCsrf::from_config())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::get().to(list_evaluations))
                    .route("/{id}", web::get().to(get_evaluation))
                    .route("/{id}", web::delete().to(delete_evaluation)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::models::ErrorCode;
    use crate::models::schedule::requests::ScheduleAction;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{dean, faculty_with_subject, in_memory_storage};
    use crate::utils::jwt::JwtUtils;
    use crate::utils::{CSRF_HEADER, CsrfSigner};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_dean_submission_through_middleware_chain() {
        let raw = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&raw, "CCS", "IT101").await;
        let dean_user = dean(&raw, "CCS").await;
        let storage: Arc<dyn Storage> = Arc::new(raw);
        storage
            .apply_schedule_action(ScheduleAction::OpenNow { notice: None }, dean_user, None)
            .await
            .unwrap();
        let responses: Vec<_> = storage
            .list_criteria(false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| serde_json::json!({ "criterion_id": c.id, "rating": 5 }))
            .collect();
        let body = serde_json::json!({
            "faculty_id": faculty_id,
            "subject": "IT101",
            "responses": responses,
        });

        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(cache))
                .configure(configure_evaluation_routes),
        )
        .await;

        let bearer = format!(
            "Bearer {}",
            JwtUtils::generate_access_token(dean_user, "dean").unwrap()
        );
        let csrf = CsrfSigner::from_config()
            .issue(dean_user, chrono::Utc::now())
            .unwrap();
        let submit = |with_csrf: bool| {
            let mut req = test::TestRequest::post()
                .uri("/api/v1/dean/evaluations")
                .insert_header(("Authorization", bearer.clone()))
                .set_json(&body);
            if with_csrf {
                req = req.insert_header((CSRF_HEADER, csrf.clone()));
            }
            req.to_request()
        };

        let resp = test::call_service(&app, submit(false)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::CsrfTokenInvalid as i32);

        let resp = test::call_service(&app, submit(true)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["faculty_id"], faculty_id);

        let resp = test::call_service(&app, submit(true)).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], ErrorCode::EvaluationAlreadySubmitted as i32);

        let unauthenticated = test::TestRequest::post()
            .uri("/api/v1/dean/evaluations")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, unauthenticated).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
