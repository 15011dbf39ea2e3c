//! 路径参数提取器
//!
//! 解析失败时直接返回统一格式的 400 响应，不暴露 actix 的默认错误文本。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_parameter(name: &str) -> actix_web::Error {
    InternalError::from_response(
        format!("invalid path parameter: {name}"),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            format!("Invalid path parameter: {name}"),
        )),
    )
    .into()
}

/// 解析正整数路径参数
pub fn parse_positive_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.parse::<i64>().ok()).filter(|v| *v > 0)
}

macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(
                    parse_positive_i64(req.match_info().get($param))
                        .map($name)
                        .ok_or_else(|| bad_path_parameter($param)),
                )
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");
define_safe_i64_extractor!(SafeFacultyIdI64, "faculty_id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_i64() {
        assert_eq!(parse_positive_i64(Some("5")), Some(5));
        assert_eq!(parse_positive_i64(Some("0")), None);
        assert_eq!(parse_positive_i64(Some("-3")), None);
        assert_eq!(parse_positive_i64(Some("abc")), None);
        assert_eq!(parse_positive_i64(None), None);
    }
}
