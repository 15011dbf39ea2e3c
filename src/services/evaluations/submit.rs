use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::EvaluationService;
use super::validate::validate_submission;
use crate::errors::EvalSystemError;
use crate::middlewares::RequestContext;
use crate::models::evaluations::entities::{Evaluation, Evaluator};
use crate::models::evaluations::requests::{NewEvaluation, SubmitEvaluationRequest};
use crate::models::faculties::entities::FacultySummary;
use crate::models::subjects::requests::SubjectListParams;
use crate::models::users::entities::UserStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::schedule::admit;
use crate::services::storage_error_response;
use crate::storage::Storage;

/// 提交入口，决定评教人身份的推导方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Student,
    FacultySelf,
    Dean,
}

/// 提交被拒绝的原因
#[derive(Debug)]
pub(crate) enum Rejection {
    Closed(String),
    NoPeriod(String),
    FacultyNotFound,
    NotPermitted(&'static str),
    Invalid(String),
    NotAssigned,
    Duplicate(String),
    Storage(EvalSystemError),
}

impl Rejection {
    fn into_response(self) -> HttpResponse {
        match self {
            Rejection::Closed(msg) => HttpResponse::Forbidden()
                .json(ApiResponse::error_empty(ErrorCode::EvaluationClosed, msg)),
            Rejection::NoPeriod(msg) => HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::NoActivePeriod, msg)),
            Rejection::FacultyNotFound => HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::FacultyNotFound,
                "Faculty not found",
            )),
            Rejection::NotPermitted(msg) => HttpResponse::Forbidden()
                .json(ApiResponse::error_empty(ErrorCode::Forbidden, msg)),
            Rejection::Invalid(msg) => HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::EvaluationInvalid, msg)),
            Rejection::NotAssigned => HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FacultyNotAssignedToSubject,
                "The faculty member does not teach this subject",
            )),
            Rejection::Duplicate(msg) => HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::EvaluationAlreadySubmitted,
                msg,
            )),
            Rejection::Storage(e) => storage_error_response(&e, ErrorCode::InternalServerError),
        }
    }
}

impl From<EvalSystemError> for Rejection {
    fn from(e: EvalSystemError) -> Self {
        match e {
            EvalSystemError::AdmissionDenied(msg) => Rejection::Closed(msg),
            EvalSystemError::DuplicateEvaluation(msg) => Rejection::Duplicate(msg),
            other => Rejection::Storage(other),
        }
    }
}

/// 院长只能评价本学院的教师，院系在入库时已规范化
pub(crate) fn same_department(dean_department: Option<&str>, faculty: &FacultySummary) -> bool {
    match (dean_department, faculty.department.as_deref()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

async fn resolve_evaluator(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    kind: SubmissionKind,
    faculty: &FacultySummary,
) -> Result<Evaluator, Rejection> {
    match kind {
        SubmissionKind::Student => match storage.get_student_by_user_id(ctx.user_id).await? {
            Some(student) => Ok(Evaluator::Student {
                user_id: ctx.user_id,
                student_id: student.id,
            }),
            None => Err(Rejection::NotPermitted("Student record not found for this account")),
        },
        SubmissionKind::FacultySelf => match storage.get_faculty_by_user_id(ctx.user_id).await? {
            Some(own) if own.faculty_id == faculty.faculty_id => {
                Ok(Evaluator::FacultySelf { user_id: ctx.user_id })
            }
            Some(_) => Err(Rejection::NotPermitted(
                "Self-evaluation is only allowed for your own record",
            )),
            None => Err(Rejection::NotPermitted("Faculty record not found for this account")),
        },
        SubmissionKind::Dean => {
            if same_department(ctx.department.as_deref(), faculty) {
                Ok(Evaluator::Dean { user_id: ctx.user_id })
            } else {
                Err(Rejection::NotPermitted(
                    "Deans can only evaluate faculty in their own department",
                ))
            }
        }
    }
}

/// 评教提交流程
///
/// 准入检查最先执行；学期由服务端按 `now` 推算。
pub(crate) async fn submit_evaluation_for(
    storage: &Arc<dyn Storage>,
    ctx: &RequestContext,
    kind: SubmissionKind,
    req: SubmitEvaluationRequest,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Evaluation, Rejection> {
    let period = admit(storage, now, offset).await.map_err(|e| match e {
        EvalSystemError::Validation(msg) => Rejection::NoPeriod(msg),
        other => Rejection::from(other),
    })?;

    // 停用教师与不存在同等对待
    let faculty = storage
        .get_faculty_by_id(req.faculty_id)
        .await?
        .filter(|f| f.status == UserStatus::Active)
        .ok_or(Rejection::FacultyNotFound)?;

    let evaluator = resolve_evaluator(storage, ctx, kind, &faculty).await?;

    let criteria = storage.list_criteria(false).await?;
    let validated = validate_submission(&criteria, &req).map_err(Rejection::Invalid)?;

    if !storage
        .faculty_teaches_subject(faculty.faculty_id, &validated.subject)
        .await?
    {
        return Err(Rejection::NotAssigned);
    }

    // 学生只能评价本学院开设的课程，与待评列表一致
    if kind == SubmissionKind::Student
        && let Some(department) = ctx.department.clone()
    {
        let offered = storage
            .list_subjects(SubjectListParams {
                department: Some(department),
                faculty_id: Some(faculty.faculty_id),
            })
            .await?;
        if !offered.iter().any(|s| s.code == validated.subject) {
            return Err(Rejection::NotPermitted(
                "Students can only evaluate subjects offered by their department",
            ));
        }
    }

    let evaluation = storage
        .submit_evaluation(NewEvaluation {
            evaluator,
            faculty_id: faculty.faculty_id,
            subject: validated.subject,
            period,
            ratings: validated.ratings,
            comments: validated.comments,
            is_anonymous: kind == SubmissionKind::Student && req.is_anonymous,
        })
        .await?;

    Ok(evaluation)
}

pub async fn submit(
    service: &EvaluationService,
    ctx: &RequestContext,
    kind: SubmissionKind,
    req: SubmitEvaluationRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let offset = service.get_config().local_offset();

    match submit_evaluation_for(&storage, ctx, kind, req, Utc::now(), offset).await {
        Ok(evaluation) => {
            info!(
                "Evaluation {} submitted by user {} for faculty {}",
                evaluation.id, ctx.user_id, evaluation.faculty_id
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(evaluation, "Evaluation submitted successfully")))
        }
        Err(rejection) => {
            warn!("Evaluation by user {} rejected: {:?}", ctx.user_id, rejection);
            Ok(rejection.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluations::requests::RatingInput;
    use crate::models::schedule::entities::OverrideMode;
    use crate::models::schedule::requests::ScheduleAction;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::UpdateUserRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{
        dean, faculty_with_subject, in_memory_storage, student,
    };
    use chrono::TimeZone;

    struct Fixture {
        raw: SeaOrmStorage,
        storage: Arc<dyn Storage>,
        faculty_id: i64,
        faculty_user_id: i64,
        criterion_ids: Vec<i64>,
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn october() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 9, 0, 0).unwrap()
    }

    fn ctx(user_id: i64, role: UserRole, department: &str) -> RequestContext {
        RequestContext {
            user_id,
            role,
            department: Some(department.to_string()),
            must_change_password: false,
        }
    }

    fn request(faculty_id: i64, criterion_ids: &[i64]) -> SubmitEvaluationRequest {
        SubmitEvaluationRequest {
            faculty_id,
            subject: "it101".to_string(),
            responses: criterion_ids
                .iter()
                .map(|&criterion_id| RatingInput {
                    criterion_id,
                    rating: 4,
                    comment: None,
                })
                .collect(),
            comments: Some("Clear lectures".to_string()),
            is_anonymous: true,
        }
    }

    async fn fixture(mode: OverrideMode) -> Fixture {
        let raw = in_memory_storage().await;
        let (faculty_id, faculty_user_id) = faculty_with_subject(&raw, "CCS", "IT101").await;
        let storage: Arc<dyn Storage> = Arc::new(raw.clone());

        // 迁移自带默认指标
        let criterion_ids = storage
            .list_criteria(false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<_>>();
        assert!(!criterion_ids.is_empty());

        let action = match mode {
            OverrideMode::Open => ScheduleAction::OpenNow { notice: None },
            OverrideMode::Closed => ScheduleAction::CloseNow { notice: None },
            OverrideMode::Auto => ScheduleAction::SetAuto,
        };
        storage
            .apply_schedule_action(action, faculty_user_id, None)
            .await
            .unwrap();

        Fixture {
            raw,
            storage,
            faculty_id,
            faculty_user_id,
            criterion_ids,
        }
    }

    #[tokio::test]
    async fn test_student_submission_uses_server_period() {
        let f = fixture(OverrideMode::Open).await;
        let (user_id, student_id) = student(&f.raw, "CCS").await;
        let ctx = ctx(user_id, UserRole::Student, "CCS");

        let evaluation = submit_evaluation_for(
            &f.storage,
            &ctx,
            SubmissionKind::Student,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap();

        assert_eq!(evaluation.student_id, Some(student_id));
        assert_eq!(evaluation.subject, "IT101");
        assert_eq!(evaluation.semester, "1st Semester");
        assert_eq!(evaluation.academic_year, "2025-2026");
        assert!(evaluation.is_anonymous);
        assert!(!evaluation.is_self);

        let again = submit_evaluation_for(
            &f.storage,
            &ctx,
            SubmissionKind::Student,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(again, Rejection::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_closed_schedule_rejects_before_anything_else() {
        let f = fixture(OverrideMode::Closed).await;
        let (user_id, _) = student(&f.raw, "CCS").await;

        // 即便教师不存在，也先报告窗口关闭
        let err = submit_evaluation_for(
            &f.storage,
            &ctx(user_id, UserRole::Student, "CCS"),
            SubmissionKind::Student,
            request(9999, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::Closed(_)));
    }

    #[tokio::test]
    async fn test_july_has_no_period() {
        let f = fixture(OverrideMode::Open).await;
        let (user_id, _) = student(&f.raw, "CCS").await;

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(user_id, UserRole::Student, "CCS"),
            SubmissionKind::Student,
            request(f.faculty_id, &f.criterion_ids),
            Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::NoPeriod(_)));
    }

    #[tokio::test]
    async fn test_subject_must_be_taught() {
        let f = fixture(OverrideMode::Open).await;
        let (user_id, _) = student(&f.raw, "CCS").await;
        let mut req = request(f.faculty_id, &f.criterion_ids);
        req.subject = "IT999".to_string();

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(user_id, UserRole::Student, "CCS"),
            SubmissionKind::Student,
            req,
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::NotAssigned));
    }

    #[tokio::test]
    async fn test_student_limited_to_department_subjects() {
        let f = fixture(OverrideMode::Open).await;
        let (user_id, _) = student(&f.raw, "CBA").await;

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(user_id, UserRole::Student, "CBA"),
            SubmissionKind::Student,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::NotPermitted(_)));
    }

    #[tokio::test]
    async fn test_inactive_faculty_is_not_found() {
        let f = fixture(OverrideMode::Open).await;
        let (user_id, _) = student(&f.raw, "CCS").await;
        f.storage
            .update_user(
                f.faculty_user_id,
                UpdateUserRequest {
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(user_id, UserRole::Student, "CCS"),
            SubmissionKind::Student,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::FacultyNotFound));
    }

    #[tokio::test]
    async fn test_self_evaluation_is_never_anonymous() {
        let f = fixture(OverrideMode::Open).await;
        let ctx = ctx(f.faculty_user_id, UserRole::Faculty, "CCS");

        let evaluation = submit_evaluation_for(
            &f.storage,
            &ctx,
            SubmissionKind::FacultySelf,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap();
        assert!(evaluation.is_self);
        assert!(!evaluation.is_anonymous);
        assert_eq!(evaluation.student_id, None);
    }

    #[tokio::test]
    async fn test_self_evaluation_of_other_faculty_is_rejected() {
        let f = fixture(OverrideMode::Open).await;
        let (_, other_user) = faculty_with_subject(&f.raw, "CCS", "IT202").await;

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(other_user, UserRole::Faculty, "CCS"),
            SubmissionKind::FacultySelf,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::NotPermitted(_)));
    }

    #[tokio::test]
    async fn test_dean_limited_to_department() {
        let f = fixture(OverrideMode::Open).await;
        let own = dean(&f.raw, "CCS").await;
        let other = dean(&f.raw, "CBA").await;

        let err = submit_evaluation_for(
            &f.storage,
            &ctx(other, UserRole::Dean, "CBA"),
            SubmissionKind::Dean,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Rejection::NotPermitted(_)));

        let evaluation = submit_evaluation_for(
            &f.storage,
            &ctx(own, UserRole::Dean, "CCS"),
            SubmissionKind::Dean,
            request(f.faculty_id, &f.criterion_ids),
            october(),
            utc(),
        )
        .await
        .unwrap();
        assert_eq!(evaluation.evaluator_role, UserRole::Dean);
        assert!(!evaluation.is_anonymous);
    }

    #[test]
    fn test_same_department_requires_both_sides() {
        let faculty = FacultySummary {
            faculty_id: 1,
            user_id: 2,
            employee_id: "F-001".to_string(),
            first_name: "Jo".to_string(),
            last_name: "Reyes".to_string(),
            department: Some("CCS".to_string()),
            position: None,
            status: UserStatus::Active,
        };
        assert!(same_department(Some("CCS"), &faculty));
        assert!(!same_department(Some("ccs"), &faculty));
        assert!(!same_department(Some("CBA"), &faculty));
        assert!(!same_department(None, &faculty));
    }
}
