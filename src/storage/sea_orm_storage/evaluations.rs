//! 评教记录存储实现

use std::collections::{BTreeMap, HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{info, warn};

use super::SeaOrmStorage;
use crate::entity::evaluations::{ActiveModel, Column};
use crate::entity::prelude::{
    Criteria, EvaluationResponses, Evaluations, Faculties, FacultySubjects, Subjects, Users,
};
use crate::entity::{criteria, evaluation_responses, faculties, faculty_subjects, subjects, users};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::PaginationInfo,
    evaluations::{
        entities::{Evaluation, EvaluationDetail, EvaluationStatus},
        requests::{EvaluationListQuery, NewEvaluation},
        responses::{
            CriterionAverage, EvaluationListResponse, FacultyResultsResponse, PendingEvaluation,
            ResultComment,
        },
    },
    schedule::entities::ActivePeriod,
    users::entities::{UserRole, UserStatus},
};
use crate::utils::normalize_department;

pub const ALREADY_EVALUATED: &str =
    "You have already evaluated this faculty member for this subject in the current period";

impl SeaOrmStorage {
    /// 提交评教
    ///
    /// 重复检查、评教行和各指标评分在同一事务内完成；
    /// 并发提交绕过检查时由唯一索引兜底，同样报告为重复评教。
    pub(crate) async fn submit_evaluation_impl(&self, new: NewEvaluation) -> Result<Evaluation> {
        let now = chrono::Utc::now().timestamp();
        let overall_rating = new.overall_rating();
        let evaluator = new.evaluator;
        let semester = new.period.semester.to_string();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Evaluations::find()
            .filter(Column::EvaluatorUserId.eq(evaluator.user_id()))
            .filter(Column::EvaluatorRole.eq(evaluator.role().to_string()))
            .filter(Column::FacultyId.eq(new.faculty_id))
            .filter(Column::Subject.eq(new.subject.as_str()))
            .filter(Column::Semester.eq(semester.as_str()))
            .filter(Column::AcademicYear.eq(new.period.academic_year.as_str()))
            .filter(Column::Status.eq(EvaluationStatus::Submitted.to_string()))
            .count(&txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询已有评教失败: {e}")))?;
        if existing > 0 {
            return Err(EvalSystemError::duplicate_evaluation(ALREADY_EVALUATED));
        }

        let evaluation = ActiveModel {
            student_id: Set(evaluator.student_id()),
            evaluator_user_id: Set(evaluator.user_id()),
            evaluator_role: Set(evaluator.role().to_string()),
            faculty_id: Set(new.faculty_id),
            subject: Set(new.subject),
            semester: Set(semester),
            academic_year: Set(new.period.academic_year),
            overall_rating: Set(overall_rating),
            status: Set(EvaluationStatus::Submitted.to_string()),
            is_anonymous: Set(new.is_anonymous),
            is_self: Set(evaluator.is_self()),
            comments: Set(new.comments),
            submitted_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                warn!(
                    "Duplicate evaluation rejected by unique index for user {}",
                    evaluator.user_id()
                );
                EvalSystemError::duplicate_evaluation(ALREADY_EVALUATED)
            }
            _ => EvalSystemError::database_operation(format!("创建评教失败: {e}")),
        })?;

        let responses = new
            .ratings
            .into_iter()
            .map(|r| evaluation_responses::ActiveModel {
                evaluation_id: Set(evaluation.id),
                criterion_id: Set(r.criterion_id),
                rating: Set(r.rating),
                comment: Set(r.comment),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        if !responses.is_empty() {
            EvaluationResponses::insert_many(responses)
                .exec(&txn)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("写入评分失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("提交事务失败: {e}")))?;

        info!(
            "Evaluation {} submitted by {} {} for faculty {}",
            evaluation.id,
            evaluator.role(),
            evaluator.user_id(),
            evaluation.faculty_id
        );

        Ok(evaluation.into_evaluation())
    }

    pub(crate) async fn list_evaluations_with_pagination_impl(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        let (page, size) = PaginationInfo::normalize(query.page, query.size);

        let mut select = Evaluations::find();
        if let Some(faculty_id) = query.faculty_id {
            select = select.filter(Column::FacultyId.eq(faculty_id));
        }
        if let Some(ref subject) = query.subject {
            select = select.filter(Column::Subject.eq(subject.as_str()));
        }
        if let Some(semester) = query.semester {
            select = select.filter(Column::Semester.eq(semester.as_str()));
        }
        if let Some(ref academic_year) = query.academic_year {
            select = select.filter(Column::AcademicYear.eq(academic_year.as_str()));
        }
        if let Some(role) = query.evaluator_role {
            select = select.filter(Column::EvaluatorRole.eq(role.to_string()));
        }
        if let Some(user_id) = query.evaluator_user_id {
            select = select.filter(Column::EvaluatorUserId.eq(user_id));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size as u64);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教总数失败: {e}")))?;

        let items = paginator
            .fetch_page((page - 1) as u64)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教列表失败: {e}")))?;

        Ok(EvaluationListResponse {
            items: items.into_iter().map(|m| m.into_evaluation()).collect(),
            pagination: PaginationInfo::new(page, size, total as i64),
        })
    }

    pub(crate) async fn get_evaluation_detail_impl(
        &self,
        id: i64,
    ) -> Result<Option<EvaluationDetail>> {
        let Some(evaluation) = Evaluations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教失败: {e}")))?
        else {
            return Ok(None);
        };

        let responses = EvaluationResponses::find()
            .filter(evaluation_responses::Column::EvaluationId.eq(id))
            .order_by_asc(evaluation_responses::Column::CriterionId)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评分失败: {e}")))?;

        Ok(Some(EvaluationDetail {
            evaluation: evaluation.into_evaluation(),
            responses: responses.into_iter().map(|r| r.into_item()).collect(),
        }))
    }

    /// 删除评教，评分随外键级联删除
    pub(crate) async fn delete_evaluation_impl(&self, id: i64) -> Result<bool> {
        let result = Evaluations::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("删除评教失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 汇总教师的已提交评教
    pub(crate) async fn faculty_results_impl(
        &self,
        faculty_id: i64,
        semester: Option<String>,
        academic_year: Option<String>,
    ) -> Result<FacultyResultsResponse> {
        let mut select = Evaluations::find()
            .filter(Column::FacultyId.eq(faculty_id))
            .filter(Column::Status.eq(EvaluationStatus::Submitted.to_string()));
        if let Some(ref semester) = semester {
            select = select.filter(Column::Semester.eq(semester.as_str()));
        }
        if let Some(ref academic_year) = academic_year {
            select = select.filter(Column::AcademicYear.eq(academic_year.as_str()));
        }

        let evaluations = select
            .order_by_desc(Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评教结果失败: {e}")))?;

        let total = evaluations.len() as i64;
        let overall_average = (!evaluations.is_empty()).then(|| {
            evaluations.iter().map(|e| e.overall_rating).sum::<f64>() / evaluations.len() as f64
        });

        let ids: Vec<i64> = evaluations.iter().map(|e| e.id).collect();
        let responses = if ids.is_empty() {
            Vec::new()
        } else {
            EvaluationResponses::find()
                .filter(evaluation_responses::Column::EvaluationId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询评分失败: {e}")))?
        };

        // criterion_id -> (总分, 条数)
        let mut sums: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
        for response in &responses {
            let entry = sums.entry(response.criterion_id).or_insert((0, 0));
            entry.0 += i64::from(response.rating);
            entry.1 += 1;
        }

        let criteria_rows = if sums.is_empty() {
            Vec::new()
        } else {
            Criteria::find()
                .filter(criteria::Column::Id.is_in(sums.keys().copied().collect::<Vec<_>>()))
                .all(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询评教指标失败: {e}")))?
        };
        let mut criteria_rows = criteria_rows;
        criteria_rows.sort_by_key(|c| (c.sort_order, c.id));

        let criteria = criteria_rows
            .into_iter()
            .filter_map(|c| {
                sums.get(&c.id).map(|(sum, count)| CriterionAverage {
                    criterion_id: c.id,
                    title: c.title,
                    average: *sum as f64 / *count as f64,
                    responses: *count,
                })
            })
            .collect();

        // 实名评语需要评教人姓名
        let named: Vec<i64> = evaluations
            .iter()
            .filter(|e| !e.is_anonymous)
            .map(|e| e.evaluator_user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<i64, String> = if named.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(users::Column::Id.is_in(named))
                .all(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询评教人失败: {e}")))?
                .into_iter()
                .map(|u| (u.id, format!("{} {}", u.first_name, u.last_name)))
                .collect()
        };

        let comments = evaluations
            .into_iter()
            .filter_map(|e| {
                let comment = e.comments.as_deref().map(str::trim).unwrap_or_default();
                if comment.is_empty() {
                    return None;
                }
                let evaluator_role = match e.evaluator_role.parse::<UserRole>() {
                    Ok(role) => role,
                    Err(_) => {
                        warn!(
                            "Skipping comment of evaluation {} with unknown evaluator role {:?}",
                            e.id, e.evaluator_role
                        );
                        return None;
                    }
                };
                Some(ResultComment {
                    evaluator_role,
                    evaluator_name: if e.is_anonymous {
                        None
                    } else {
                        names.get(&e.evaluator_user_id).cloned()
                    },
                    comment: comment.to_string(),
                    submitted_at: e
                        .submitted_at
                        .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0)),
                })
            })
            .collect();

        Ok(FacultyResultsResponse {
            faculty_id,
            semester,
            academic_year,
            total_evaluations: total,
            overall_average,
            criteria,
            comments,
        })
    }

    /// 学生待评教列表：本院系课程的授课教师中，本学期尚未评教的组合
    pub(crate) async fn list_pending_evaluations_impl(
        &self,
        user_id: i64,
        department: Option<String>,
        period: ActivePeriod,
    ) -> Result<Vec<PendingEvaluation>> {
        let mut subject_select = Subjects::find();
        if let Some(department) = department.as_deref().and_then(normalize_department) {
            subject_select = subject_select.filter(subjects::Column::Department.eq(department));
        }
        let subject_rows: HashMap<i64, subjects::Model> = subject_select
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        if subject_rows.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = FacultySubjects::find()
            .filter(
                faculty_subjects::Column::SubjectId
                    .is_in(subject_rows.keys().copied().collect::<Vec<_>>()),
            )
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询授课关系失败: {e}")))?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let faculty_ids: Vec<i64> = assignments
            .iter()
            .map(|a| a.faculty_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let active = UserStatus::Active.to_string();
        let faculty_names: HashMap<i64, String> = Faculties::find()
            .filter(faculties::Column::Id.is_in(faculty_ids))
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?
            .into_iter()
            .filter_map(|(faculty, user)| {
                user.filter(|u| u.status == active)
                    .map(|u| (faculty.id, format!("{} {}", u.first_name, u.last_name)))
            })
            .collect();

        let done: HashSet<(i64, String)> = Evaluations::find()
            .select_only()
            .column(Column::FacultyId)
            .column(Column::Subject)
            .filter(Column::EvaluatorUserId.eq(user_id))
            .filter(Column::EvaluatorRole.eq(UserRole::Student.to_string()))
            .filter(Column::Semester.eq(period.semester.as_str()))
            .filter(Column::AcademicYear.eq(period.academic_year.as_str()))
            .into_tuple::<(i64, String)>()
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询已评教记录失败: {e}")))?
            .into_iter()
            .collect();

        let mut pending: Vec<PendingEvaluation> = assignments
            .into_iter()
            .filter_map(|a| {
                let subject = subject_rows.get(&a.subject_id)?;
                let faculty_name = faculty_names.get(&a.faculty_id)?;
                if done.contains(&(a.faculty_id, subject.code.clone())) {
                    return None;
                }
                Some(PendingEvaluation {
                    faculty_id: a.faculty_id,
                    faculty_name: faculty_name.clone(),
                    subject_code: subject.code.clone(),
                    subject_name: subject.name.clone(),
                })
            })
            .collect();
        pending.sort_by(|a, b| {
            a.subject_code
                .cmp(&b.subject_code)
                .then_with(|| a.faculty_name.cmp(&b.faculty_name))
        });

        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{faculties as faculty_rows, users as user_rows};
    use crate::models::criteria::entities::CriterionRemoval;
    use crate::models::evaluations::entities::Evaluator;
    use crate::models::evaluations::requests::RatingInput;
    use crate::models::schedule::entities::Semester;
    use crate::storage::sea_orm_storage::test_support::{
        dean, faculty_with_subject, in_memory_storage, student,
    };

    fn first_semester() -> ActivePeriod {
        ActivePeriod {
            semester: Semester::First,
            academic_year: "2025-2026".to_string(),
        }
    }

    async fn ratings(storage: &SeaOrmStorage, rating: i32) -> Vec<RatingInput> {
        storage
            .list_criteria_impl(false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| RatingInput {
                criterion_id: c.id,
                rating,
                comment: None,
            })
            .collect()
    }

    fn submission(
        evaluator: Evaluator,
        faculty_id: i64,
        subject: &str,
        ratings: Vec<RatingInput>,
    ) -> NewEvaluation {
        NewEvaluation {
            evaluator,
            faculty_id,
            subject: subject.to_string(),
            period: first_semester(),
            ratings,
            comments: None,
            is_anonymous: false,
        }
    }

    /// 固定主键的教师 5 与院长 7
    async fn seed_fixed_ids(storage: &SeaOrmStorage) {
        for (id, login_id, role) in [(7, "D-001", "dean"), (8, "F-001", "faculty")] {
            user_rows::ActiveModel {
                id: Set(id),
                login_id: Set(login_id.to_string()),
                email: Set(None),
                password_hash: Set("hash".to_string()),
                role: Set(role.to_string()),
                status: Set("active".to_string()),
                first_name: Set("Lee".to_string()),
                last_name: Set("Cruz".to_string()),
                department: Set(Some("CCS".to_string())),
                must_change_password: Set(false),
                last_login: Set(None),
                created_at: Set(0),
                updated_at: Set(0),
            }
            .insert(&storage.db)
            .await
            .unwrap();
        }
        faculty_rows::ActiveModel {
            id: Set(5),
            user_id: Set(8),
            employee_id: Set("F-001".to_string()),
            position: Set(None),
            created_at: Set(0),
        }
        .insert(&storage.db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_dean_second_submission_is_duplicate() {
        let storage = in_memory_storage().await;
        seed_fixed_ids(&storage).await;
        let evaluator = Evaluator::Dean { user_id: 7 };

        let first = storage
            .submit_evaluation_impl(submission(evaluator, 5, "IT101", ratings(&storage, 4).await))
            .await
            .unwrap();
        assert_eq!(first.semester, "1st Semester");
        assert_eq!(first.academic_year, "2025-2026");
        assert_eq!(first.evaluator_role, UserRole::Dean);
        assert!(first.student_id.is_none());

        let err = storage
            .submit_evaluation_impl(submission(evaluator, 5, "IT101", ratings(&storage, 2).await))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::DuplicateEvaluation(_)));

        let listed = storage
            .list_evaluations_with_pagination_impl(EvaluationListQuery {
                faculty_id: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.pagination.total, 1);
        assert_eq!(listed.items[0].overall_rating, 4.0);
    }

    #[tokio::test]
    async fn test_unique_index_backs_up_the_precheck() {
        let storage = in_memory_storage().await;
        seed_fixed_ids(&storage).await;

        // 草稿不参与重复检查，但同一组合仍受唯一索引约束
        ActiveModel {
            evaluator_user_id: Set(7),
            evaluator_role: Set("dean".to_string()),
            faculty_id: Set(5),
            subject: Set("IT101".to_string()),
            semester: Set("1st Semester".to_string()),
            academic_year: Set("2025-2026".to_string()),
            overall_rating: Set(0.0),
            status: Set(EvaluationStatus::Draft.to_string()),
            is_anonymous: Set(false),
            is_self: Set(false),
            created_at: Set(0),
            updated_at: Set(0),
            ..Default::default()
        }
        .insert(&storage.db)
        .await
        .unwrap();

        let err = storage
            .submit_evaluation_impl(submission(
                Evaluator::Dean { user_id: 7 },
                5,
                "IT101",
                ratings(&storage, 5).await,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalSystemError::DuplicateEvaluation(_)));
    }

    #[tokio::test]
    async fn test_different_period_or_evaluator_is_allowed() {
        let storage = in_memory_storage().await;
        let (faculty_id, faculty_user) = faculty_with_subject(&storage, "CCS", "IT101").await;
        let (student_user, student_id) = student(&storage, "CCS").await;

        let as_student = Evaluator::Student {
            user_id: student_user,
            student_id,
        };
        storage
            .submit_evaluation_impl(submission(
                as_student,
                faculty_id,
                "IT101",
                ratings(&storage, 5).await,
            ))
            .await
            .unwrap();

        let mut next_term = submission(as_student, faculty_id, "IT101", ratings(&storage, 3).await);
        next_term.period = ActivePeriod {
            semester: Semester::Second,
            academic_year: "2025-2026".to_string(),
        };
        storage.submit_evaluation_impl(next_term).await.unwrap();

        let own = storage
            .submit_evaluation_impl(submission(
                Evaluator::FacultySelf {
                    user_id: faculty_user,
                },
                faculty_id,
                "IT101",
                ratings(&storage, 4).await,
            ))
            .await
            .unwrap();
        assert!(own.is_self);
    }

    #[tokio::test]
    async fn test_results_average_and_hide_anonymous() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, "CCS", "IT101").await;
        let (student_user, student_id) = student(&storage, "CCS").await;
        let dean_user = dean(&storage, "CCS").await;

        let mut anonymous = submission(
            Evaluator::Student {
                user_id: student_user,
                student_id,
            },
            faculty_id,
            "IT101",
            ratings(&storage, 5).await,
        );
        anonymous.is_anonymous = true;
        anonymous.comments = Some("Very clear lectures".to_string());
        storage.submit_evaluation_impl(anonymous).await.unwrap();

        let mut named = submission(
            Evaluator::Dean { user_id: dean_user },
            faculty_id,
            "IT101",
            ratings(&storage, 3).await,
        );
        named.comments = Some("  Keep it up ".to_string());
        storage.submit_evaluation_impl(named).await.unwrap();

        let results = storage
            .faculty_results_impl(
                faculty_id,
                Some("1st Semester".to_string()),
                Some("2025-2026".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(results.total_evaluations, 2);
        assert_eq!(results.overall_average, Some(4.0));
        assert_eq!(results.criteria.len(), 6);
        assert!(results.criteria.iter().all(|c| c.average == 4.0 && c.responses == 2));

        assert_eq!(results.comments.len(), 2);
        let hidden = results
            .comments
            .iter()
            .find(|c| c.evaluator_role == UserRole::Student)
            .unwrap();
        assert!(hidden.evaluator_name.is_none());
        let shown = results
            .comments
            .iter()
            .find(|c| c.evaluator_role == UserRole::Dean)
            .unwrap();
        assert_eq!(shown.comment, "Keep it up");
        assert_eq!(shown.evaluator_name.as_deref(), Some("Jo Reyes"));

        let other_year = storage
            .faculty_results_impl(faculty_id, None, Some("2024-2025".to_string()))
            .await
            .unwrap();
        assert_eq!(other_year.total_evaluations, 0);
        assert!(other_year.overall_average.is_none());
    }

    #[tokio::test]
    async fn test_pending_excludes_evaluated_pairs() {
        let storage = in_memory_storage().await;
        let (first_faculty, _) = faculty_with_subject(&storage, "CCS", "IT101").await;
        let (second_faculty, _) = faculty_with_subject(&storage, "CCS", "IT102").await;
        faculty_with_subject(&storage, "CBA", "ACC101").await;
        let (student_user, student_id) = student(&storage, "CCS").await;

        let pending = storage
            .list_pending_evaluations_impl(student_user, Some("CCS".to_string()), first_semester())
            .await
            .unwrap();
        let pairs: Vec<_> = pending
            .iter()
            .map(|p| (p.faculty_id, p.subject_code.as_str()))
            .collect();
        assert_eq!(pairs, vec![(first_faculty, "IT101"), (second_faculty, "IT102")]);

        storage
            .submit_evaluation_impl(submission(
                Evaluator::Student {
                    user_id: student_user,
                    student_id,
                },
                first_faculty,
                "IT101",
                ratings(&storage, 4).await,
            ))
            .await
            .unwrap();

        let pending = storage
            .list_pending_evaluations_impl(student_user, Some("CCS".to_string()), first_semester())
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].subject_code, "IT102");
    }

    #[tokio::test]
    async fn test_detail_delete_and_criterion_deactivation() {
        let storage = in_memory_storage().await;
        seed_fixed_ids(&storage).await;

        let evaluation = storage
            .submit_evaluation_impl(submission(
                Evaluator::Dean { user_id: 7 },
                5,
                "IT101",
                ratings(&storage, 4).await,
            ))
            .await
            .unwrap();

        let detail = storage
            .get_evaluation_detail_impl(evaluation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.responses.len(), 6);

        // 已被评分引用的指标只能停用
        let criterion = detail.responses[0].criterion_id;
        assert_eq!(
            storage.remove_criterion_impl(criterion).await.unwrap(),
            CriterionRemoval::Deactivated
        );
        assert_eq!(storage.list_criteria_impl(false).await.unwrap().len(), 5);

        assert!(storage.delete_evaluation_impl(evaluation.id).await.unwrap());
        assert!(
            storage
                .get_evaluation_detail_impl(evaluation.id)
                .await
                .unwrap()
                .is_none()
        );
        let orphaned = EvaluationResponses::find()
            .filter(evaluation_responses::Column::EvaluationId.eq(evaluation.id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[tokio::test]
    async fn test_unknown_evaluator_role_comment_is_skipped() {
        let storage = in_memory_storage().await;
        seed_fixed_ids(&storage).await;

        ActiveModel {
            evaluator_user_id: Set(7),
            evaluator_role: Set("registrar".to_string()),
            faculty_id: Set(5),
            subject: Set("IT101".to_string()),
            semester: Set("1st Semester".to_string()),
            academic_year: Set("2025-2026".to_string()),
            overall_rating: Set(4.0),
            comments: Set(Some("Unlabelled".to_string())),
            status: Set(EvaluationStatus::Submitted.to_string()),
            is_anonymous: Set(false),
            is_self: Set(false),
            created_at: Set(0),
            updated_at: Set(0),
            ..Default::default()
        }
        .insert(&storage.db)
        .await
        .unwrap();

        let results = storage.faculty_results_impl(5, None, None).await.unwrap();
        assert_eq!(results.total_evaluations, 1);
        assert!(results.comments.is_empty());
    }

    #[tokio::test]
    async fn test_pending_matches_department_in_any_case() {
        let storage = in_memory_storage().await;
        let (faculty_id, _) = faculty_with_subject(&storage, "ccs ", "IT101").await;
        let (student_user, _) = student(&storage, "Ccs").await;

        let pending = storage
            .list_pending_evaluations_impl(student_user, Some("ccs".to_string()), first_semester())
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].faculty_id, faculty_id);
    }
}
