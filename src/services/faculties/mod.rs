pub mod assign;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::faculties::requests::{AssignSubjectsRequest, FacultyListParams};
use crate::storage::Storage;

pub struct FacultyService {
    storage: Option<Arc<dyn Storage>>,
}

impl FacultyService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => crate::services::storage_from_request(request),
        }
    }

    pub async fn list_faculties(
        &self,
        params: FacultyListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_faculties(self, params, request).await
    }

    pub async fn list_subjects(
        &self,
        faculty_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_faculty_subjects(self, faculty_id, request).await
    }

    pub async fn assign_subjects(
        &self,
        faculty_id: i64,
        req: AssignSubjectsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        assign::assign_subjects(self, faculty_id, req, request).await
    }
}
