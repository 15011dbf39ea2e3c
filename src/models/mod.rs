pub mod auth;
pub mod common;
pub mod criteria;
pub mod evaluations;
pub mod faculties;
pub mod schedule;
pub mod subjects;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

use serde::Serialize;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1xxx
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1002,
    NotFound = 1003,
    RateLimitExceeded = 1004,
    CsrfTokenInvalid = 1005,
    InternalServerError = 1999,

    // 认证与用户 2xxx
    AuthFailed = 2000,
    PasswordChangeRequired = 2001,
    UserPasswordInvalid = 2002,
    UserNotFound = 2100,
    UserAlreadyExists = 2101,
    UserCreationFailed = 2102,
    UserUpdateFailed = 2103,
    UserDeleteFailed = 2104,
    CanNotDeleteCurrentUser = 2105,
    UserEmailInvalid = 2106,
    IdSequenceExhausted = 2107,

    // 课程、教师与指标 3xxx
    SubjectNotFound = 3000,
    SubjectAlreadyExists = 3001,
    FacultyNotFound = 3010,
    FacultyNotAssignedToSubject = 3011,
    CriterionNotFound = 3020,

    // 评教 4xxx
    EvaluationClosed = 4000,
    NoActivePeriod = 4001,
    EvaluationAlreadySubmitted = 4002,
    EvaluationInvalid = 4003,
    EvaluationNotFound = 4004,
    ScheduleInvalid = 4010,
}
