//! 登录编号分配
//!
//! 每个前缀在 `id_sequences` 表中占一行。分配步骤在调用方的事务内执行：
//! 缺失的前缀行先按现有最大编号补齐，再原子自增并读回。
//! 自增语句持有行锁，并发事务会在此串行化，回滚则释放已分配的编号。

use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};

use crate::entity::id_sequences::{ActiveModel, Column, Entity as IdSequences};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{EvalSystemError, Result};
use crate::models::users::requests::NewRoleRecord;

/// 编号后缀上限（三位数）
pub const MAX_SEQUENCE_VALUE: i64 = 999;

pub const FACULTY_PREFIX: &str = "F";
pub const DEAN_PREFIX: &str = "D";

/// 格式化为 `前缀-三位序号`
pub fn format_sequential_id(prefix: &str, value: i64) -> String {
    format!("{prefix}-{value:03}")
}

/// 角色档案对应的编号前缀，管理员没有
pub(crate) fn prefix_for(record: &NewRoleRecord) -> Option<&'static str> {
    match record {
        NewRoleRecord::Student { gender, .. } => Some(gender.id_prefix()),
        NewRoleRecord::Faculty { .. } => Some(FACULTY_PREFIX),
        NewRoleRecord::Dean => Some(DEAN_PREFIX),
        NewRoleRecord::Admin { .. } => None,
    }
}

/// 解析编号后缀
fn parse_suffix(prefix: &str, login_id: &str) -> Option<i64> {
    login_id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<i64>().ok())
}

/// 现有用户中该前缀的最大编号
async fn existing_max<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<i64> {
    let login_ids: Vec<String> = Users::find()
        .select_only()
        .column(UserColumn::LoginId)
        .filter(UserColumn::LoginId.starts_with(format!("{prefix}-")))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询现有编号失败: {e}")))?;

    Ok(login_ids
        .iter()
        .filter_map(|id| parse_suffix(prefix, id))
        .max()
        .unwrap_or(0))
}

/// 分配下一个编号，返回完整的登录编号
pub(crate) async fn claim_next_id<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp();

    // 首次使用该前缀时按现有数据补齐
    let seed = existing_max(conn, prefix).await?;
    let mut on_conflict = OnConflict::column(Column::Prefix);
    on_conflict.do_nothing();
    IdSequences::insert(ActiveModel {
        prefix: Set(prefix.to_string()),
        last_value: Set(seed),
        updated_at: Set(now),
    })
    .on_conflict(on_conflict)
    .do_nothing()
    .exec(conn)
    .await
    .map_err(|e| EvalSystemError::database_operation(format!("初始化编号序列失败: {e}")))?;

    IdSequences::update_many()
        .col_expr(Column::LastValue, Expr::col(Column::LastValue).add(1))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Prefix.eq(prefix))
        .exec(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("分配编号失败: {e}")))?;

    let claimed = IdSequences::find_by_id(prefix.to_string())
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("读取编号序列失败: {e}")))?
        .ok_or_else(|| EvalSystemError::database_operation(format!("编号序列不存在: {prefix}")))?;

    if claimed.last_value > MAX_SEQUENCE_VALUE {
        return Err(EvalSystemError::id_sequence_exhausted(format!(
            "No more identifiers available for prefix {prefix}"
        )));
    }

    Ok(format_sequential_id(prefix, claimed.last_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::in_memory_storage;
    use sea_orm::{ActiveModelTrait, TransactionTrait};

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_sequential_id("F", 1), "F-001");
        assert_eq!(format_sequential_id("222", 42), "222-042");
        assert_eq!(format_sequential_id("D", 999), "D-999");
    }

    #[test]
    fn test_parse_suffix() {
        assert_eq!(parse_suffix("F", "F-017"), Some(17));
        assert_eq!(parse_suffix("222", "222-100"), Some(100));
        assert_eq!(parse_suffix("222", "221-100"), None);
        assert_eq!(parse_suffix("F", "F-"), None);
        assert_eq!(parse_suffix("F", "F-01a"), None);
    }

    #[tokio::test]
    async fn test_sequential_claims_strictly_increase() {
        let storage = in_memory_storage().await;

        let mut previous = 0;
        for expected in 1..=5 {
            let id = claim_next_id(&storage.db, FACULTY_PREFIX).await.unwrap();
            assert_eq!(id, format_sequential_id(FACULTY_PREFIX, expected));
            let value = parse_suffix(FACULTY_PREFIX, &id).unwrap();
            assert!(value > previous);
            previous = value;
        }

        // 不同前缀互不影响
        let dean = claim_next_id(&storage.db, DEAN_PREFIX).await.unwrap();
        assert_eq!(dean, "D-001");
    }

    #[tokio::test]
    async fn test_rolled_back_claim_is_released() {
        let storage = in_memory_storage().await;

        let txn = storage.db.begin().await.unwrap();
        let first = claim_next_id(&txn, "222").await.unwrap();
        assert_eq!(first, "222-001");
        txn.rollback().await.unwrap();

        let again = claim_next_id(&storage.db, "222").await.unwrap();
        assert_eq!(again, "222-001");
    }

    #[tokio::test]
    async fn test_claim_fails_after_999() {
        let storage = in_memory_storage().await;

        ActiveModel {
            prefix: Set(DEAN_PREFIX.to_string()),
            last_value: Set(MAX_SEQUENCE_VALUE),
            updated_at: Set(0),
        }
        .insert(&storage.db)
        .await
        .unwrap();

        let err = claim_next_id(&storage.db, DEAN_PREFIX).await.unwrap_err();
        assert!(matches!(err, EvalSystemError::IdSequenceExhausted(_)));
    }
}
