//! 评教时间窗口存储实现

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use crate::entity::evaluation_schedule::{self, SCHEDULE_ROW_ID};
use crate::entity::evaluation_schedule_audit;
use crate::entity::prelude::{EvaluationSchedule as ScheduleRows, EvaluationScheduleAudit};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::PaginationInfo,
    schedule::{
        entities::{EvaluationSchedule, OverrideMode},
        requests::{ScheduleAction, ScheduleAuditQuery},
        responses::ScheduleAuditListResponse,
    },
};

/// 读取单例行，不存在时以 auto 模式创建
async fn load_or_create<C: ConnectionTrait>(conn: &C) -> Result<evaluation_schedule::Model> {
    if let Some(row) = ScheduleRows::find_by_id(SCHEDULE_ROW_ID)
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("读取评教窗口失败: {e}")))?
    {
        return Ok(row);
    }

    debug!("Evaluation schedule row missing, creating it");
    let mut on_conflict = OnConflict::column(evaluation_schedule::Column::Id);
    on_conflict.do_nothing();
    ScheduleRows::insert(evaluation_schedule::ActiveModel {
        id: Set(SCHEDULE_ROW_ID),
        start_at: Set(None),
        end_at: Set(None),
        override_mode: Set(OverrideMode::Auto.to_string()),
        notice: Set(None),
        updated_at: Set(chrono::Utc::now().timestamp()),
        updated_by: Set(None),
    })
    .on_conflict(on_conflict)
    .do_nothing()
    .exec(conn)
    .await
    .map_err(|e| EvalSystemError::database_operation(format!("创建评教窗口失败: {e}")))?;

    ScheduleRows::find_by_id(SCHEDULE_ROW_ID)
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("读取评教窗口失败: {e}")))?
        .ok_or_else(|| EvalSystemError::database_operation("评教窗口创建后仍不存在"))
}

impl SeaOrmStorage {
    pub(crate) async fn get_schedule_impl(&self) -> Result<EvaluationSchedule> {
        Ok(load_or_create(&self.db).await?.into_schedule())
    }

    /// 对事务内读到的窗口行执行操作，旧值与新值一起写入审计日志
    ///
    /// 操作校验失败时事务回滚，不写审计。
    pub(crate) async fn apply_schedule_action_impl(
        &self,
        action: ScheduleAction,
        changed_by: i64,
        ip_address: Option<String>,
    ) -> Result<EvaluationSchedule> {
        let now = chrono::Utc::now();
        let action_name = action.name();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = load_or_create(&txn).await?;
        let current = existing.clone().into_schedule();
        let old_value = serde_json::to_string(&current)?;
        let schedule = action.apply(&current, changed_by, now)?;

        let mut model: evaluation_schedule::ActiveModel = existing.into();
        model.start_at = Set(schedule.start_at.map(|t| t.timestamp()));
        model.end_at = Set(schedule.end_at.map(|t| t.timestamp()));
        model.override_mode = Set(schedule.override_mode.to_string());
        model.notice = Set(schedule.notice);
        model.updated_at = Set(now.timestamp());
        model.updated_by = Set(Some(changed_by));

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("更新评教窗口失败: {e}")))?
            .into_schedule();

        evaluation_schedule_audit::ActiveModel {
            action: Set(action_name.to_string()),
            old_value: Set(Some(old_value)),
            new_value: Set(serde_json::to_string(&updated)?),
            changed_by: Set(changed_by),
            changed_at: Set(now.timestamp()),
            ip_address: Set(ip_address),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("写入审计日志失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("提交事务失败: {e}")))?;

        info!(
            "Evaluation schedule changed by user {}: {} (mode {})",
            changed_by, action_name, updated.override_mode
        );

        Ok(updated)
    }

    pub(crate) async fn list_schedule_audits_impl(
        &self,
        query: ScheduleAuditQuery,
    ) -> Result<ScheduleAuditListResponse> {
        let (page, size) = PaginationInfo::normalize(query.page, query.size);

        let paginator = EvaluationScheduleAudit::find()
            .order_by_desc(evaluation_schedule_audit::Column::ChangedAt)
            .order_by_desc(evaluation_schedule_audit::Column::Id)
            .paginate(&self.db, size as u64);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询审计日志总数失败: {e}")))?;

        let audits = paginator
            .fetch_page((page - 1) as u64)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询审计日志失败: {e}")))?;

        Ok(ScheduleAuditListResponse {
            items: audits.into_iter().map(|a| a.into_audit()).collect(),
            pagination: PaginationInfo::new(page, size, total as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::in_memory_storage;

    #[tokio::test]
    async fn test_missing_row_is_created_lazily() {
        let storage = in_memory_storage().await;

        ScheduleRows::delete_by_id(SCHEDULE_ROW_ID)
            .exec(&storage.db)
            .await
            .unwrap();

        let schedule = storage.get_schedule_impl().await.unwrap();
        assert_eq!(schedule.override_mode, OverrideMode::Auto);
        assert!(schedule.start_at.is_none());

        // 再次读取不会产生第二行
        storage.get_schedule_impl().await.unwrap();
        assert_eq!(ScheduleRows::find().count(&storage.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_writes_audit_with_old_and_new_values() {
        let storage = in_memory_storage().await;

        let saved = storage
            .apply_schedule_action_impl(
                ScheduleAction::OpenNow {
                    notice: Some("Evaluation is open".to_string()),
                },
                1,
                Some("127.0.0.1".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(saved.override_mode, OverrideMode::Open);
        assert_eq!(saved.updated_by, Some(1));

        let audits = storage
            .list_schedule_audits_impl(ScheduleAuditQuery::default())
            .await
            .unwrap();
        assert_eq!(audits.pagination.total, 1);
        let audit = &audits.items[0];
        assert_eq!(audit.action, "open_now");
        assert!(audit.old_value.as_deref().unwrap().contains("\"auto\""));
        assert!(audit.new_value.contains("\"open\""));
        assert_eq!(audit.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_actions_apply_to_latest_row() {
        let storage = in_memory_storage().await;
        let start = chrono::Utc::now();
        let end = start + chrono::Duration::days(14);

        // 两个管理员先后操作，后者不会覆盖前者保存的窗口
        storage
            .apply_schedule_action_impl(
                ScheduleAction::SaveSchedule {
                    start_at: start,
                    end_at: end,
                    notice: Some("Midterm".to_string()),
                },
                1,
                None,
            )
            .await
            .unwrap();
        let closed = storage
            .apply_schedule_action_impl(ScheduleAction::CloseNow { notice: None }, 2, None)
            .await
            .unwrap();

        assert_eq!(closed.override_mode, OverrideMode::Closed);
        assert_eq!(closed.start_at.map(|t| t.timestamp()), Some(start.timestamp()));
        assert_eq!(closed.end_at.map(|t| t.timestamp()), Some(end.timestamp()));
        assert_eq!(closed.notice.as_deref(), Some("Midterm"));
        assert_eq!(closed.updated_by, Some(2));
    }

    #[tokio::test]
    async fn test_invalid_action_leaves_row_and_audit_untouched() {
        let storage = in_memory_storage().await;
        let start = chrono::Utc::now();

        let err = storage
            .apply_schedule_action_impl(
                ScheduleAction::SaveSchedule {
                    start_at: start,
                    end_at: start,
                    notice: None,
                },
                1,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::Validation(_)));

        let schedule = storage.get_schedule_impl().await.unwrap();
        assert!(schedule.start_at.is_none());
        let audits = storage
            .list_schedule_audits_impl(ScheduleAuditQuery::default())
            .await
            .unwrap();
        assert_eq!(audits.pagination.total, 0);
    }
}
