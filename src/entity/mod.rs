//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod criteria;
pub mod deans;
pub mod evaluation_responses;
pub mod evaluation_schedule;
pub mod evaluation_schedule_audit;
pub mod evaluations;
pub mod faculties;
pub mod faculty_subjects;
pub mod id_sequences;
pub mod students;
pub mod subjects;
pub mod users;
