use actix_web::{HttpResponse, Result as ActixResult};

use crate::middlewares::RequestContext;
use crate::models::auth::CsrfTokenResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::csrf::{CSRF_HEADER, CsrfSigner};

/// 为当前用户签发 CSRF 令牌
pub async fn handle_issue_csrf(ctx: RequestContext) -> ActixResult<HttpResponse> {
    let signer = CsrfSigner::from_config();
    match signer.issue(ctx.user_id, chrono::Utc::now()) {
        Ok(token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CsrfTokenResponse {
                token,
                header_name: CSRF_HEADER.to_string(),
                expires_in: signer.expiry_secs(),
            },
            "CSRF token issued",
        ))),
        Err(e) => {
            tracing::error!("Failed to issue CSRF token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to issue CSRF token",
                )),
            )
        }
    }
}
