pub mod list;
pub mod manage;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::middlewares::RequestContext;
use crate::models::criteria::requests::{
    CreateCriterionRequest, CriteriaListParams, UpdateCriterionRequest,
};
use crate::storage::Storage;

pub struct CriteriaService {
    storage: Option<Arc<dyn Storage>>,
}

impl CriteriaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => crate::services::storage_from_request(request),
        }
    }

    pub async fn list_criteria(
        &self,
        ctx: &RequestContext,
        params: CriteriaListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_criteria(self, ctx, params, request).await
    }

    pub async fn create_criterion(
        &self,
        req: CreateCriterionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_criterion(self, req, request).await
    }

    pub async fn update_criterion(
        &self,
        id: i64,
        req: UpdateCriterionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_criterion(self, id, req, request).await
    }

    pub async fn delete_criterion(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        manage::delete_criterion(self, id, request).await
    }
}
