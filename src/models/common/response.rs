use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::ErrorCode;

// 统一的API响应结构
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "api.ts")]
pub struct ApiResponse<T: TS> {
    pub success: bool,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        debug_assert!(code != ErrorCode::Success);
        Self {
            success: code == ErrorCode::Success,
            code: code as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: code == ErrorCode::Success,
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flag_follows_code() {
        let ok = ApiResponse::success_empty("done");
        assert!(ok.success);
        assert_eq!(ok.code, 0);

        let err = ApiResponse::error_empty(ErrorCode::EvaluationAlreadySubmitted, "dup");
        assert!(!err.success);
        assert_eq!(err.code, ErrorCode::EvaluationAlreadySubmitted as i32);
    }

    #[test]
    fn test_empty_data_is_omitted() {
        let json = serde_json::to_value(ApiResponse::success_empty("ok")).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["success"], true);
    }
}
