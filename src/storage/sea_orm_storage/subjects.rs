//! 课程存储实现

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::{SeaOrmStorage, write_error};
use crate::entity::prelude::{FacultySubjects, Subjects};
use crate::entity::{faculty_subjects, subjects::ActiveModel, subjects::Column};
use crate::errors::{EvalSystemError, Result};
use crate::models::subjects::{
    entities::Subject,
    requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
};
use crate::utils::normalize_department;

impl SeaOrmStorage {
    pub(crate) async fn list_subjects_impl(&self, params: SubjectListParams) -> Result<Vec<Subject>> {
        let mut select = Subjects::find();

        if let Some(department) = params.department.as_deref().and_then(normalize_department) {
            select = select.filter(Column::Department.eq(department));
        }

        if let Some(faculty_id) = params.faculty_id {
            let subject_ids: Vec<i64> = FacultySubjects::find()
                .select_only()
                .column(faculty_subjects::Column::SubjectId)
                .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询授课关系失败: {e}")))?;
            select = select.filter(Column::Id.is_in(subject_ids));
        }

        let subjects = select
            .order_by_asc(Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(subjects.into_iter().map(|s| s.into_subject()).collect())
    }

    pub(crate) async fn get_subject_by_id_impl(&self, id: i64) -> Result<Option<Subject>> {
        let subject = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(subject.map(|s| s.into_subject()))
    }

    pub(crate) async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            code: Set(req.code),
            name: Set(req.name),
            department: Set(req.department.as_deref().and_then(normalize_department)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| write_error("创建课程失败", e))?;

        Ok(model.into_subject())
    }

    pub(crate) async fn update_subject_impl(
        &self,
        id: i64,
        req: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        let Some(existing) = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(code) = req.code {
            model.code = Set(code);
        }
        if let Some(name) = req.name {
            model.name = Set(name);
        }
        if let Some(department) = req.department {
            model.department = Set(normalize_department(&department));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| write_error("更新课程失败", e))?;

        Ok(Some(updated.into_subject()))
    }

    pub(crate) async fn delete_subject_impl(&self, id: i64) -> Result<bool> {
        let result = Subjects::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::in_memory_storage;

    fn subject(code: &str, department: &str) -> CreateSubjectRequest {
        CreateSubjectRequest {
            code: code.to_string(),
            name: format!("{code} lecture"),
            department: Some(department.to_string()),
        }
    }

    #[tokio::test]
    async fn test_subject_code_is_unique() {
        let storage = in_memory_storage().await;

        storage.create_subject_impl(subject("IT101", "CCS")).await.unwrap();
        let err = storage
            .create_subject_impl(subject("IT101", "CBA"))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_department() {
        let storage = in_memory_storage().await;

        storage.create_subject_impl(subject("IT102", "CCS")).await.unwrap();
        storage.create_subject_impl(subject("IT101", "CCS")).await.unwrap();
        storage.create_subject_impl(subject("ACC101", "CBA")).await.unwrap();

        let ccs = storage
            .list_subjects_impl(SubjectListParams {
                department: Some("CCS".to_string()),
                faculty_id: None,
            })
            .await
            .unwrap();
        let codes: Vec<_> = ccs.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["IT101", "IT102"]);
    }
}
