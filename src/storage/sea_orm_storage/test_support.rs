//! 存储层测试夹具

use migration::{Migrator, MigratorTrait};
use sea_orm::SqlxSqliteConnector;
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use super::SeaOrmStorage;
use crate::models::subjects::requests::CreateSubjectRequest;
use crate::models::users::entities::{Gender, RoleProfile};
use crate::models::users::requests::{NewRoleRecord, NewUser};

/// 内存数据库，单连接保证所有查询落在同一个库上
pub(crate) async fn in_memory_storage() -> SeaOrmStorage {
    let opt = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opt)
        .await
        .unwrap();
    let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
    Migrator::up(&db, None).await.unwrap();
    SeaOrmStorage::from_connection(db)
}

fn account(department: &str, record: NewRoleRecord) -> NewUser {
    NewUser {
        first_name: "Jo".to_string(),
        last_name: "Reyes".to_string(),
        email: None,
        department: Some(department.to_string()),
        password_hash: "hash".to_string(),
        must_change_password: false,
        record,
    }
}

/// 创建课程和讲授它的教师，返回 (faculties.id, users.id)
pub(crate) async fn faculty_with_subject(
    storage: &SeaOrmStorage,
    department: &str,
    code: &str,
) -> (i64, i64) {
    let subject = storage
        .create_subject_impl(CreateSubjectRequest {
            code: code.to_string(),
            name: format!("{code} lecture"),
            department: Some(department.to_string()),
        })
        .await
        .unwrap();
    let (user, profile) = storage
        .create_user_impl(account(
            department,
            NewRoleRecord::Faculty {
                position: None,
                subject_ids: vec![subject.id],
            },
        ))
        .await
        .unwrap();
    match profile {
        RoleProfile::Faculty(p) => (p.id, user.id),
        other => panic!("unexpected profile: {other:?}"),
    }
}

/// 返回 (users.id, students.id)
pub(crate) async fn student(storage: &SeaOrmStorage, department: &str) -> (i64, i64) {
    let (user, profile) = storage
        .create_user_impl(account(
            department,
            NewRoleRecord::Student {
                gender: Gender::Female,
                program: None,
                year_level: None,
                section: None,
            },
        ))
        .await
        .unwrap();
    match profile {
        RoleProfile::Student(p) => (user.id, p.id),
        other => panic!("unexpected profile: {other:?}"),
    }
}

/// 返回 users.id
pub(crate) async fn dean(storage: &SeaOrmStorage, department: &str) -> i64 {
    let (user, _) = storage
        .create_user_impl(account(department, NewRoleRecord::Dean))
        .await
        .unwrap();
    user.id
}
