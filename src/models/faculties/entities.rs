use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserStatus;

// 教师列表项（教师档案 + 用户信息）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "faculty.ts")]
pub struct FacultySummary {
    pub faculty_id: i64,
    pub user_id: i64,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub status: UserStatus,
}

impl FacultySummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_bindings_stay_in_export_dir() {
        assert_eq!(FacultySummary::output_path(), Some(PathBuf::from("faculty.ts")));
    }
}
