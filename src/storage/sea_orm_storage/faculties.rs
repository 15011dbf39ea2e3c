//! 教师与授课关系存储实现

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, TransactionTrait,
};

use super::{SeaOrmStorage, users::insert_faculty_subjects};
use crate::entity::prelude::{Faculties, FacultySubjects, Subjects, Users};
use crate::entity::{faculty_subjects, subjects, users};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    faculties::{entities::FacultySummary, requests::FacultyListParams},
    subjects::entities::Subject,
};
use crate::utils::normalize_department;

impl SeaOrmStorage {
    pub(crate) async fn list_faculties_impl(
        &self,
        params: FacultyListParams,
    ) -> Result<Vec<FacultySummary>> {
        let mut select = Faculties::find().find_also_related(Users);

        if let Some(department) = params.department.as_deref().and_then(normalize_department) {
            select = select.filter(users::Column::Department.eq(department));
        }

        let rows = select
            .order_by_asc(users::Column::LastName)
            .order_by_asc(users::Column::FirstName)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师列表失败: {e}")))?;

        // 按课程代码过滤
        let teaching: Option<HashSet<i64>> = match params.subject {
            Some(ref code) if !code.trim().is_empty() => {
                let ids: Vec<i64> = FacultySubjects::find()
                    .select_only()
                    .column(faculty_subjects::Column::FacultyId)
                    .join(JoinType::InnerJoin, faculty_subjects::Relation::Subject.def())
                    .filter(subjects::Column::Code.eq(code.trim()))
                    .into_tuple()
                    .all(&self.db)
                    .await
                    .map_err(|e| {
                        EvalSystemError::database_operation(format!("查询授课关系失败: {e}"))
                    })?;
                Some(ids.into_iter().collect())
            }
            _ => None,
        };

        Ok(rows
            .into_iter()
            .filter_map(|(faculty, user)| user.map(|u| faculty.into_summary(u)))
            .filter(|f| teaching.as_ref().is_none_or(|ids| ids.contains(&f.faculty_id)))
            .collect())
    }

    pub(crate) async fn get_faculty_by_id_impl(
        &self,
        faculty_id: i64,
    ) -> Result<Option<FacultySummary>> {
        let result = Faculties::find_by_id(faculty_id)
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(match result {
            Some((faculty, Some(user))) => Some(faculty.into_summary(user)),
            _ => None,
        })
    }

    pub(crate) async fn list_faculty_subjects_impl(&self, faculty_id: i64) -> Result<Vec<Subject>> {
        let subjects = Subjects::find()
            .join(JoinType::InnerJoin, subjects::Relation::FacultySubjects.def())
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .order_by_asc(subjects::Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师课程失败: {e}")))?;

        Ok(subjects.into_iter().map(|s| s.into_subject()).collect())
    }

    pub(crate) async fn faculty_teaches_subject_impl(
        &self,
        faculty_id: i64,
        subject_code: &str,
    ) -> Result<bool> {
        let count = FacultySubjects::find()
            .join(JoinType::InnerJoin, faculty_subjects::Relation::Subject.def())
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .filter(subjects::Column::Code.eq(subject_code))
            .count(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询授课关系失败: {e}")))?;

        Ok(count > 0)
    }

    /// 整体替换授课课程（删除旧关系后写入新关系）
    pub(crate) async fn assign_faculty_subjects_impl(
        &self,
        faculty_id: i64,
        subject_ids: Vec<i64>,
    ) -> Result<Vec<Subject>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let exists = Faculties::find_by_id(faculty_id)
            .count(&txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?;
        if exists == 0 {
            return Err(EvalSystemError::not_found(format!(
                "Faculty {faculty_id} not found"
            )));
        }

        FacultySubjects::delete_many()
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .exec(&txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("清除授课关系失败: {e}")))?;

        insert_faculty_subjects(&txn, faculty_id, &subject_ids, now).await?;

        txn.commit()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("提交事务失败: {e}")))?;

        self.list_faculty_subjects_impl(faculty_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::entities::UserStatus;
    use crate::storage::sea_orm_storage::test_support::{faculty_with_subject, in_memory_storage};

    #[tokio::test]
    async fn test_teaches_subject_by_code() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, "CCS", "IT101").await;

        assert!(
            storage
                .faculty_teaches_subject_impl(faculty_id, "IT101")
                .await
                .unwrap()
        );
        assert!(
            !storage
                .faculty_teaches_subject_impl(faculty_id, "IT999")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_department_stored_uppercase_and_filtered_in_any_case() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, " ccs", "IT101").await;
        faculty_with_subject(&storage, "CBA", "ACC101").await;

        let listed = storage
            .list_faculties_impl(FacultyListParams {
                department: Some("Ccs ".to_string()),
                subject: None,
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].faculty_id, faculty_id);
        assert_eq!(listed[0].department.as_deref(), Some("CCS"));
        assert_eq!(listed[0].status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_assign_replaces_existing_subjects() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, "CCS", "IT101").await;
        let other = storage
            .create_subject_impl(CreateSubjectRequest {
                code: "IT201".to_string(),
                name: "Data Structures".to_string(),
                department: Some("CCS".to_string()),
            })
            .await
            .unwrap();

        let subjects = storage
            .assign_faculty_subjects_impl(faculty_id, vec![other.id, other.id])
            .await
            .unwrap();
        let codes: Vec<_> = subjects.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["IT201"]);

        let filtered = storage
            .list_faculties_impl(FacultyListParams {
                department: None,
                subject: Some("IT101".to_string()),
            })
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_assign_unknown_subject_keeps_old_set() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, "CCS", "IT101").await;

        let err = storage
            .assign_faculty_subjects_impl(faculty_id, vec![9999])
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::NotFound(_)));

        let subjects = storage.list_faculty_subjects_impl(faculty_id).await.unwrap();
        assert_eq!(subjects.len(), 1);
    }
}
