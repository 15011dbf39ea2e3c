pub mod action;
pub mod admission;
pub mod audits;
pub mod status;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middlewares::RequestContext;
use crate::models::schedule::requests::{ScheduleAction, ScheduleAuditQuery};
use crate::storage::Storage;

pub use admission::{admit, check_admission, derive_period};

pub struct ScheduleService {
    storage: Option<Arc<dyn Storage>>,
}

impl ScheduleService {
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

    // 当前窗口与准入状态
    pub async fn get_status(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        status::get_status(self, request).await
    }

    // 管理员操作
    pub async fn apply(
        &self,
        ctx: RequestContext,
        action: ScheduleAction,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        action::handle_action(self, ctx, action, request).await
    }

    pub async fn list_audits(
        &self,
        query: ScheduleAuditQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        audits::list_audits(self, query, request).await
    }
}
