use serde::Deserialize;
use ts_rs::TS;

// 课程列表查询参数
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "subject.ts")]
pub struct SubjectListParams {
    pub department: Option<String>,
    /// 只返回该教师承担的课程
    pub faculty_id: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "subject.ts")]
pub struct CreateSubjectRequest {
    pub code: String,
    pub name: String,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "subject.ts")]
pub struct UpdateSubjectRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
}
