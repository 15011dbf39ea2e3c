use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CriteriaService;
use crate::models::criteria::entities::CriterionRemoval;
use crate::models::criteria::requests::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;

const MAX_TITLE_LEN: usize = 200;

fn check_title(title: &str) -> Result<(), &'static str> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Criterion title must not be empty");
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err("Criterion title must be at most 200 characters");
    }
    Ok(())
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::CriterionNotFound,
        "Criterion not found",
    ))
}

pub async fn create_criterion(
    service: &CriteriaService,
    mut req: CreateCriterionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = check_title(&req.title) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }
    req.title = req.title.trim().to_string();

    let storage = service.get_storage(request)?;
    match storage.create_criterion(req).await {
        Ok(criterion) => {
            info!("Criterion {} created", criterion.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(criterion, "Criterion created")))
        }
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn update_criterion(
    service: &CriteriaService,
    id: i64,
    mut req: UpdateCriterionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(title) = &req.title {
        if let Err(msg) = check_title(title) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
        req.title = Some(title.trim().to_string());
    }

    let storage = service.get_storage(request)?;
    match storage.update_criterion(id, req).await {
        Ok(Some(criterion)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(criterion, "Criterion updated")))
        }
        Ok(None) => Ok(not_found()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

pub async fn delete_criterion(
    service: &CriteriaService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.remove_criterion(id).await {
        Ok(CriterionRemoval::Deleted) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Criterion deleted")))
        }
        Ok(CriterionRemoval::Deactivated) => {
            info!("Criterion {} has ratings, deactivated instead of deleted", id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Criterion is referenced by existing evaluations and was deactivated",
            )))
        }
        Ok(CriterionRemoval::NotFound) => Ok(not_found()),
        Err(e) => Ok(storage_error_response(&e, ErrorCode::InternalServerError)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_title() {
        assert!(check_title("Mastery of subject matter").is_ok());
        assert!(check_title("   ").is_err());
        assert!(check_title(&"x".repeat(201)).is_err());
        assert!(check_title(&"x".repeat(200)).is_ok());
    }
}
