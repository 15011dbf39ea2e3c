//! 评教准入判定
//!
//! 纯函数部分只依赖窗口设置与当前时间，数据库读取失败时由 [`admit`] 统一拒绝。

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tracing::error;

use crate::errors::{EvalSystemError, Result};
use crate::models::schedule::entities::{
    ActivePeriod, AdmissionDecision, AdmissionReason, EvaluationSchedule, OverrideMode, Semester,
};
use crate::storage::Storage;

/// 按本地日期推算学期；7 月不属于任何学期
pub fn derive_period(date: NaiveDate) -> Option<ActivePeriod> {
    let year = date.year();
    match date.month() {
        8..=12 => Some(ActivePeriod {
            semester: Semester::First,
            academic_year: format!("{}-{}", year, year + 1),
        }),
        1..=6 => Some(ActivePeriod {
            semester: Semester::Second,
            academic_year: format!("{}-{}", year - 1, year),
        }),
        _ => None,
    }
}

pub fn check_admission<Tz: TimeZone>(
    schedule: &EvaluationSchedule,
    now: &DateTime<Tz>,
) -> AdmissionDecision {
    let now_utc = now.with_timezone(&Utc);
    let (allowed, reason) = match schedule.override_mode {
        OverrideMode::Open => (true, AdmissionReason::Override),
        OverrideMode::Closed => (false, AdmissionReason::Override),
        OverrideMode::Auto => match (schedule.start_at, schedule.end_at) {
            (Some(start), Some(end)) if start <= now_utc && now_utc <= end => {
                (true, AdmissionReason::Schedule)
            }
            _ => (false, AdmissionReason::Unscheduled),
        },
    };

    AdmissionDecision {
        allowed,
        reason,
        period: derive_period(now.date_naive()),
    }
}

/// 拒绝提交时展示给用户的说明
pub fn denial_message(schedule: &EvaluationSchedule, now: DateTime<Utc>) -> String {
    let base = match schedule.override_mode {
        OverrideMode::Closed => "Evaluations are currently closed by the administrator".to_string(),
        OverrideMode::Open => "Evaluations are open".to_string(),
        OverrideMode::Auto => match (schedule.start_at, schedule.end_at) {
            (Some(start), Some(_)) if now < start => format!(
                "The evaluation period has not started yet. It opens at {}",
                start.to_rfc3339()
            ),
            (Some(_), Some(end)) if now > end => "The evaluation period has ended".to_string(),
            _ => "The evaluation period has not been scheduled".to_string(),
        },
    };

    match schedule.notice.as_deref().map(str::trim) {
        Some(notice) if !notice.is_empty() => format!("{base}. {notice}"),
        _ => base,
    }
}

/// 评教提交前的准入检查，通过时返回服务端推算的学期
pub async fn admit(
    storage: &Arc<dyn Storage>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<ActivePeriod> {
    let schedule = match storage.get_schedule().await {
        Ok(schedule) => schedule,
        Err(e) => {
            error!("Failed to read evaluation schedule, denying submission: {}", e);
            return Err(EvalSystemError::admission_denied(
                "Evaluation availability could not be verified, please try again later",
            ));
        }
    };

    let decision = check_admission(&schedule, &now.with_timezone(&offset));
    if !decision.allowed {
        return Err(EvalSystemError::admission_denied(denial_message(&schedule, now)));
    }

    decision.period.ok_or_else(|| {
        EvalSystemError::validation("No academic period is active for the current date")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn schedule(
        mode: OverrideMode,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> EvaluationSchedule {
        EvaluationSchedule {
            start_at,
            end_at,
            override_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_override_open_ignores_window() {
        let s = schedule(OverrideMode::Open, None, None);
        let d = check_admission(&s, &at(2025, 7, 15, 9, 0));
        assert!(d.allowed);
        assert_eq!(d.reason, AdmissionReason::Override);
        assert_eq!(d.period, None);
    }

    #[test]
    fn test_override_closed_inside_window() {
        let s = schedule(
            OverrideMode::Closed,
            Some(at(2025, 10, 1, 8, 0)),
            Some(at(2025, 10, 15, 17, 0)),
        );
        let d = check_admission(&s, &at(2025, 10, 10, 9, 0));
        assert!(!d.allowed);
        assert_eq!(d.reason, AdmissionReason::Override);
    }

    #[test]
    fn test_auto_inside_window() {
        let s = schedule(
            OverrideMode::Auto,
            Some(at(2025, 10, 1, 8, 0)),
            Some(at(2025, 10, 15, 17, 0)),
        );
        let d = check_admission(&s, &at(2025, 10, 10, 0, 0));
        assert!(d.allowed);
        assert_eq!(d.reason, AdmissionReason::Schedule);
        assert_eq!(
            d.period,
            Some(ActivePeriod {
                semester: Semester::First,
                academic_year: "2025-2026".to_string(),
            })
        );
    }

    #[test]
    fn test_auto_window_bounds_are_inclusive() {
        let start = at(2025, 10, 1, 8, 0);
        let end = at(2025, 10, 15, 17, 0);
        let s = schedule(OverrideMode::Auto, Some(start), Some(end));
        assert!(check_admission(&s, &start).allowed);
        assert!(check_admission(&s, &end).allowed);
        assert!(!check_admission(&s, &(start - Duration::seconds(1))).allowed);
        assert!(!check_admission(&s, &(end + Duration::seconds(1))).allowed);
    }

    #[test]
    fn test_auto_with_missing_bound_is_unscheduled() {
        let now = at(2025, 10, 10, 0, 0);
        for s in [
            schedule(OverrideMode::Auto, None, None),
            schedule(OverrideMode::Auto, Some(at(2025, 10, 1, 8, 0)), None),
            schedule(OverrideMode::Auto, None, Some(at(2025, 10, 15, 17, 0))),
        ] {
            let d = check_admission(&s, &now);
            assert!(!d.allowed);
            assert_eq!(d.reason, AdmissionReason::Unscheduled);
        }
    }

    #[test]
    fn test_period_uses_local_date() {
        // UTC 7 月 31 日 20:00 在 +08:00 已是 8 月 1 日
        let s = schedule(OverrideMode::Open, None, None);
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = at(2025, 7, 31, 20, 0).with_timezone(&offset);
        let d = check_admission(&s, &now);
        assert_eq!(d.period.map(|p| p.semester), Some(Semester::First));
    }

    #[test]
    fn test_derive_period() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        let first = derive_period(d(2025, 8, 1)).unwrap();
        assert_eq!(first.semester, Semester::First);
        assert_eq!(first.academic_year, "2025-2026");

        let second = derive_period(d(2026, 1, 15)).unwrap();
        assert_eq!(second.semester, Semester::Second);
        assert_eq!(second.academic_year, "2025-2026");

        assert_eq!(derive_period(d(2026, 6, 30)).unwrap().academic_year, "2025-2026");
        assert!(derive_period(d(2026, 7, 1)).is_none());
        assert!(derive_period(d(2026, 7, 31)).is_none());
    }

    #[test]
    fn test_denial_message() {
        let start = at(2025, 10, 1, 8, 0);
        let end = at(2025, 10, 15, 17, 0);
        let s = schedule(OverrideMode::Auto, Some(start), Some(end));
        assert!(denial_message(&s, at(2025, 9, 1, 0, 0)).contains("not started"));
        assert!(denial_message(&s, at(2025, 11, 1, 0, 0)).contains("ended"));

        let mut closed = schedule(OverrideMode::Closed, None, None);
        closed.notice = Some("Reopens after finals".to_string());
        let msg = denial_message(&closed, at(2025, 11, 1, 0, 0));
        assert!(msg.contains("closed"));
        assert!(msg.ends_with("Reopens after finals"));

        let unset = schedule(OverrideMode::Auto, None, None);
        assert!(denial_message(&unset, start).contains("not been scheduled"));
    }

    mod gate {
        use super::*;
        use crate::models::schedule::requests::ScheduleAction;
        use crate::storage::sea_orm_storage::test_support::in_memory_storage;
        use sea_orm::ConnectionTrait;

        fn utc() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }

        #[tokio::test]
        async fn test_admit_follows_stored_schedule() {
            let now = at(2025, 10, 10, 9, 0);
            let shared: Arc<dyn Storage> = Arc::new(in_memory_storage().await);

            // 初始为 auto 且未设置窗口
            let err = admit(&shared, now, utc()).await.unwrap_err();
            assert!(matches!(err, EvalSystemError::AdmissionDenied(_)));

            shared
                .apply_schedule_action(ScheduleAction::OpenNow { notice: None }, 1, None)
                .await
                .unwrap();

            let period = admit(&shared, now, utc()).await.unwrap();
            assert_eq!(period.semester, Semester::First);
            assert_eq!(period.academic_year, "2025-2026");

            // 7 月开放也无法提交
            let err = admit(&shared, at(2026, 7, 10, 9, 0), utc()).await.unwrap_err();
            assert!(matches!(err, EvalSystemError::Validation(_)));
        }

        #[tokio::test]
        async fn test_admit_fails_closed_when_schedule_unreadable() {
            let storage = in_memory_storage().await;
            for table in ["evaluation_schedule_audit", "evaluation_schedule"] {
                storage
                    .db
                    .execute_unprepared(&format!("DROP TABLE {table}"))
                    .await
                    .unwrap();
            }
            let shared: Arc<dyn Storage> = Arc::new(storage);

            let err = admit(&shared, at(2025, 10, 10, 9, 0), utc()).await.unwrap_err();
            assert!(matches!(err, EvalSystemError::AdmissionDenied(_)));
        }
    }
}
