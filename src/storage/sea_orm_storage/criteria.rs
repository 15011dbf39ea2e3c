//! 评教指标存储实现

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::SeaOrmStorage;
use crate::entity::criteria::{ActiveModel, Column};
use crate::entity::evaluation_responses;
use crate::entity::prelude::{Criteria, EvaluationResponses};
use crate::errors::{EvalSystemError, Result};
use crate::models::criteria::{
    entities::{Criterion, CriterionRemoval},
    requests::{CreateCriterionRequest, UpdateCriterionRequest},
};

impl SeaOrmStorage {
    pub(crate) async fn list_criteria_impl(&self, include_inactive: bool) -> Result<Vec<Criterion>> {
        let mut select = Criteria::find();
        if !include_inactive {
            select = select.filter(Column::IsActive.eq(true));
        }

        let criteria = select
            .order_by_asc(Column::SortOrder)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教指标失败: {e}")))?;

        Ok(criteria.into_iter().map(|c| c.into_criterion()).collect())
    }

    pub(crate) async fn create_criterion_impl(
        &self,
        req: CreateCriterionRequest,
    ) -> Result<Criterion> {
        let now = chrono::Utc::now().timestamp();

        // 未指定顺序时排在最后
        let sort_order = match req.sort_order {
            Some(order) => order,
            None => {
                let max = Criteria::find()
                    .select_only()
                    .column_as(Column::SortOrder.max(), "max_order")
                    .into_tuple::<Option<i32>>()
                    .one(&self.db)
                    .await
                    .map_err(|e| {
                        EvalSystemError::database_operation(format!("查询指标顺序失败: {e}"))
                    })?
                    .flatten();
                max.unwrap_or(0) + 1
            }
        };

        let model = ActiveModel {
            title: Set(req.title),
            description: Set(req.description),
            category: Set(req.category),
            sort_order: Set(sort_order),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("创建评教指标失败: {e}")))?;

        Ok(model.into_criterion())
    }

    pub(crate) async fn update_criterion_impl(
        &self,
        id: i64,
        req: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>> {
        let Some(existing) = Criteria::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教指标失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(title) = req.title {
            model.title = Set(title);
        }
        if let Some(description) = req.description {
            model.description = Set(Some(description));
        }
        if let Some(category) = req.category {
            model.category = Set(Some(category));
        }
        if let Some(sort_order) = req.sort_order {
            model.sort_order = Set(sort_order);
        }
        if let Some(is_active) = req.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("更新评教指标失败: {e}")))?;

        Ok(Some(updated.into_criterion()))
    }

    /// 删除指标；已有评分引用时改为停用以保留历史结果
    pub(crate) async fn remove_criterion_impl(&self, id: i64) -> Result<CriterionRemoval> {
        let Some(existing) = Criteria::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教指标失败: {e}")))?
        else {
            return Ok(CriterionRemoval::NotFound);
        };

        let referenced = EvaluationResponses::find()
            .filter(evaluation_responses::Column::CriterionId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询指标引用失败: {e}")))?;

        if referenced > 0 {
            let mut model: ActiveModel = existing.into();
            model.is_active = Set(false);
            model.updated_at = Set(chrono::Utc::now().timestamp());
            model
                .update(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("停用评教指标失败: {e}")))?;
            return Ok(CriterionRemoval::Deactivated);
        }

        Criteria::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("删除评教指标失败: {e}")))?;

        Ok(CriterionRemoval::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::in_memory_storage;

    #[tokio::test]
    async fn test_default_criteria_are_seeded_in_order() {
        let storage = in_memory_storage().await;

        let criteria = storage.list_criteria_impl(false).await.unwrap();
        assert_eq!(criteria.len(), 6);
        assert!(criteria.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
    }

    #[tokio::test]
    async fn test_new_criterion_goes_last() {
        let storage = in_memory_storage().await;

        let created = storage
            .create_criterion_impl(CreateCriterionRequest {
                title: "Use of technology".to_string(),
                description: None,
                category: None,
                sort_order: None,
            })
            .await
            .unwrap();
        assert_eq!(created.sort_order, 7);
    }

    #[tokio::test]
    async fn test_unreferenced_criterion_is_deleted() {
        let storage = in_memory_storage().await;

        let first = storage.list_criteria_impl(false).await.unwrap()[0].id;
        assert_eq!(
            storage.remove_criterion_impl(first).await.unwrap(),
            CriterionRemoval::Deleted
        );
        assert_eq!(
            storage.remove_criterion_impl(first).await.unwrap(),
            CriterionRemoval::NotFound
        );
        assert_eq!(storage.list_criteria_impl(true).await.unwrap().len(), 5);
    }
}
