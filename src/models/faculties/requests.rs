use serde::Deserialize;
use ts_rs::TS;

// 教师列表查询参数
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "faculty.ts")]
pub struct FacultyListParams {
    pub department: Option<String>,
    /// 课程代码，只返回承担该课程的教师
    pub subject: Option<String>,
}

// 替换教师授课课程
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "faculty.ts")]
pub struct AssignSubjectsRequest {
    pub subject_ids: Vec<i64>,
}
