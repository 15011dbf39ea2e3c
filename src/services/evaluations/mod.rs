pub mod admin;
pub mod results;
pub mod student;
pub mod submit;
pub mod validate;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middlewares::RequestContext;
use crate::models::PaginationQuery;
use crate::models::evaluations::requests::{
    EvaluationListParams, ResultsParams, SubmitEvaluationRequest,
};
use crate::storage::Storage;

pub use submit::SubmissionKind;
pub use validate::validate_submission;

pub struct EvaluationService {
    storage: Option<Arc<dyn Storage>>,
}

impl EvaluationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => crate::services::storage_from_request(request),
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 学生、教师自评、院长评教共用的提交流程
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        kind: SubmissionKind,
        req: SubmitEvaluationRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit(self, ctx, kind, req, request).await
    }

    pub async fn list_pending(
        &self,
        ctx: &RequestContext,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        student::list_pending(self, ctx, request).await
    }

    pub async fn list_own(
        &self,
        ctx: &RequestContext,
        pagination: PaginationQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        student::list_own(self, ctx, pagination, request).await
    }

    pub async fn own_results(
        &self,
        ctx: &RequestContext,
        params: ResultsParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::own_results(self, ctx, params, request).await
    }

    pub async fn department_faculty(
        &self,
        ctx: &RequestContext,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::department_faculty(self, ctx, request).await
    }

    pub async fn dean_results(
        &self,
        ctx: &RequestContext,
        faculty_id: i64,
        params: ResultsParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::dean_results(self, ctx, faculty_id, params, request).await
    }

    pub async fn list_evaluations(
        &self,
        params: EvaluationListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::list_evaluations(self, params, request).await
    }

    pub async fn get_evaluation(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        admin::get_evaluation(self, id, request).await
    }

    pub async fn delete_evaluation(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        admin::delete_evaluation(self, id, request).await
    }
}
