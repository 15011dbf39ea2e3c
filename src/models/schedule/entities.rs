use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 管理员设置的窗口开关
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "schedule.ts")]
pub enum OverrideMode {
    /// 按时间窗口判断
    Auto,
    /// 强制开放
    Open,
    /// 强制关闭
    Closed,
}

impl std::fmt::Display for OverrideMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideMode::Auto => write!(f, "auto"),
            OverrideMode::Open => write!(f, "open"),
            OverrideMode::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for OverrideMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OverrideMode::Auto),
            "open" => Ok(OverrideMode::Open),
            "closed" => Ok(OverrideMode::Closed),
            _ => Err(format!("Invalid override mode: {s}")),
        }
    }
}

/// 评教时间窗口（全局唯一一行）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct EvaluationSchedule {
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
    pub override_mode: OverrideMode,
    pub notice: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

impl Default for EvaluationSchedule {
    fn default() -> Self {
        Self {
            start_at: None,
            end_at: None,
            override_mode: OverrideMode::Auto,
            notice: None,
            updated_at: chrono::Utc::now(),
            updated_by: None,
        }
    }
}

/// 学期
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "schedule.ts")]
pub enum Semester {
    #[serde(rename = "1st Semester")]
    First,
    #[serde(rename = "2nd Semester")]
    Second,
}

impl Semester {
    pub const FIRST: &'static str = "1st Semester";
    pub const SECOND: &'static str = "2nd Semester";

    pub fn as_str(&self) -> &'static str {
        match self {
            Semester::First => Self::FIRST,
            Semester::Second => Self::SECOND,
        }
    }
}

impl std::fmt::Display for Semester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Semester {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Semester::FIRST => Ok(Semester::First),
            Semester::SECOND => Ok(Semester::Second),
            _ => Err(format!("Invalid semester: {s}")),
        }
    }
}

/// 当前学期与学年，写入新的评教记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct ActivePeriod {
    pub semester: Semester,
    /// 形如 2025-2026
    pub academic_year: String,
}

/// 准入判定依据
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "schedule.ts")]
pub enum AdmissionReason {
    Override,
    Schedule,
    Unscheduled,
}

/// 评教提交准入结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reason: AdmissionReason,
    pub period: Option<ActivePeriod>,
}

// 窗口变更审计记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "schedule.ts")]
pub struct ScheduleAudit {
    pub id: i64,
    pub action: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: i64,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub ip_address: Option<String>,
}
