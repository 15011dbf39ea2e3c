use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::{EvaluationSchedule, OverrideMode};
use crate::errors::{EvalSystemError, Result};

const MAX_NOTICE_LENGTH: usize = 500;

fn normalize_notice(notice: Option<String>) -> Result<Option<String>> {
    match notice.map(|n| n.trim().to_string()) {
        Some(n) if n.chars().count() > MAX_NOTICE_LENGTH => Err(EvalSystemError::validation(
            format!("Notice must be at most {MAX_NOTICE_LENGTH} characters"),
        )),
        Some(n) if n.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// 管理员对评教窗口的操作，按 `action` 字段分发
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "schedule.ts")]
pub enum ScheduleAction {
    SaveSchedule {
        start_at: chrono::DateTime<chrono::Utc>,
        end_at: chrono::DateTime<chrono::Utc>,
        notice: Option<String>,
    },
    OpenNow {
        notice: Option<String>,
    },
    CloseNow {
        notice: Option<String>,
    },
    SetAuto,
}

impl ScheduleAction {
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleAction::SaveSchedule { .. } => "save_schedule",
            ScheduleAction::OpenNow { .. } => "open_now",
            ScheduleAction::CloseNow { .. } => "close_now",
            ScheduleAction::SetAuto => "set_auto",
        }
    }

    /// 计算操作后的窗口设置
    ///
    /// `save_schedule` 只改时间窗口与公告，不改变开关；
    /// `open_now` / `close_now` 只有提供公告时才覆盖原公告。
    pub fn apply(
        self,
        current: &EvaluationSchedule,
        actor: i64,
        now: DateTime<Utc>,
    ) -> Result<EvaluationSchedule> {
        let mut next = current.clone();
        match self {
            ScheduleAction::SaveSchedule {
                start_at,
                end_at,
                notice,
            } => {
                if start_at >= end_at {
                    return Err(EvalSystemError::validation(
                        "Start time must be earlier than end time",
                    ));
                }
                next.start_at = Some(start_at);
                next.end_at = Some(end_at);
                next.notice = normalize_notice(notice)?;
            }
            ScheduleAction::OpenNow { notice } => {
                next.override_mode = OverrideMode::Open;
                if let Some(notice) = normalize_notice(notice)? {
                    next.notice = Some(notice);
                }
            }
            ScheduleAction::CloseNow { notice } => {
                next.override_mode = OverrideMode::Closed;
                if let Some(notice) = normalize_notice(notice)? {
                    next.notice = Some(notice);
                }
            }
            ScheduleAction::SetAuto => {
                next.override_mode = OverrideMode::Auto;
            }
        }
        next.updated_at = now;
        next.updated_by = Some(actor);
        Ok(next)
    }
}

// 审计日志查询
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct ScheduleAuditQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_save_schedule_keeps_override() {
        let current = EvaluationSchedule {
            override_mode: OverrideMode::Closed,
            ..Default::default()
        };
        let next = ScheduleAction::SaveSchedule {
            start_at: at(1, 8),
            end_at: at(15, 17),
            notice: Some("  Midterm evaluations  ".to_string()),
        }
        .apply(&current, 1, at(1, 0))
        .unwrap();
        assert_eq!(next.override_mode, OverrideMode::Closed);
        assert_eq!(next.start_at, Some(at(1, 8)));
        assert_eq!(next.notice.as_deref(), Some("Midterm evaluations"));
        assert_eq!(next.updated_by, Some(1));
    }

    #[test]
    fn test_save_schedule_rejects_inverted_window() {
        let err = ScheduleAction::SaveSchedule {
            start_at: at(15, 17),
            end_at: at(1, 8),
            notice: None,
        }
        .apply(&EvaluationSchedule::default(), 1, at(1, 0))
        .unwrap_err();
        assert!(matches!(err, EvalSystemError::Validation(_)));

        let same = at(1, 8);
        assert!(
            ScheduleAction::SaveSchedule {
                start_at: same,
                end_at: same,
                notice: None,
            }
            .apply(&EvaluationSchedule::default(), 1, at(1, 0))
            .is_err()
        );
    }

    #[test]
    fn test_open_close_and_auto() {
        let current = EvaluationSchedule {
            notice: Some("Original".to_string()),
            start_at: Some(at(1, 8)),
            end_at: Some(at(15, 17)),
            ..Default::default()
        };

        let opened = ScheduleAction::OpenNow { notice: None }
            .apply(&current, 2, at(2, 0))
            .unwrap();
        assert_eq!(opened.override_mode, OverrideMode::Open);
        assert_eq!(opened.notice.as_deref(), Some("Original"));
        assert_eq!(opened.start_at, current.start_at);

        let closed = ScheduleAction::CloseNow {
            notice: Some("Closed for maintenance".to_string()),
        }
        .apply(&opened, 2, at(2, 1))
        .unwrap();
        assert_eq!(closed.override_mode, OverrideMode::Closed);
        assert_eq!(closed.notice.as_deref(), Some("Closed for maintenance"));

        let auto = ScheduleAction::SetAuto.apply(&closed, 2, at(2, 2)).unwrap();
        assert_eq!(auto.override_mode, OverrideMode::Auto);
        assert_eq!(auto.end_at, current.end_at);
    }

    #[test]
    fn test_action_dispatch_from_json() {
        let action: ScheduleAction = serde_json::from_str(
            r#"{"action":"save_schedule","start_at":"2025-10-01T08:00:00Z","end_at":"2025-10-15T17:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(action.name(), "save_schedule");

        let action: ScheduleAction = serde_json::from_str(r#"{"action":"set_auto"}"#).unwrap();
        assert_eq!(action.name(), "set_auto");

        assert!(serde_json::from_str::<ScheduleAction>(r#"{"action":"reopen"}"#).is_err());
    }
}
