//! 预导入模块，方便使用

pub use super::criteria::{
    ActiveModel as CriterionActiveModel, Entity as Criteria, Model as CriterionModel,
};
pub use super::deans::{ActiveModel as DeanActiveModel, Entity as Deans, Model as DeanModel};
pub use super::evaluation_responses::{
    ActiveModel as EvaluationResponseActiveModel, Entity as EvaluationResponses,
    Model as EvaluationResponseModel,
};
pub use super::evaluation_schedule::{
    ActiveModel as ScheduleActiveModel, Entity as EvaluationSchedule, Model as ScheduleModel,
};
pub use super::evaluation_schedule_audit::{
    ActiveModel as ScheduleAuditActiveModel, Entity as EvaluationScheduleAudit,
    Model as ScheduleAuditModel,
};
pub use super::evaluations::{
    ActiveModel as EvaluationActiveModel, Entity as Evaluations, Model as EvaluationModel,
};
pub use super::faculties::{
    ActiveModel as FacultyActiveModel, Entity as Faculties, Model as FacultyModel,
};
pub use super::faculty_subjects::{
    ActiveModel as FacultySubjectActiveModel, Entity as FacultySubjects,
    Model as FacultySubjectModel,
};
pub use super::id_sequences::{
    ActiveModel as IdSequenceActiveModel, Entity as IdSequences, Model as IdSequenceModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
