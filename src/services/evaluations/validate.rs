use std::collections::HashSet;

use crate::models::criteria::entities::Criterion;
use crate::models::evaluations::requests::{RatingInput, SubmitEvaluationRequest};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
const MAX_COMMENT_LEN: usize = 2000;

/// 通过校验的评教内容
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub subject: String,
    pub ratings: Vec<RatingInput>,
    pub comments: Option<String>,
}

fn clean_comment(comment: Option<&str>) -> Result<Option<String>, String> {
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) if c.chars().count() > MAX_COMMENT_LEN => Err(format!(
            "Comments must be at most {MAX_COMMENT_LEN} characters"
        )),
        Some(c) => Ok(Some(c.to_string())),
        None => Ok(None),
    }
}

/// 校验评教提交
///
/// 每个启用中的指标必须且只能评分一次，评分范围 1..=5。
pub fn validate_submission(
    active_criteria: &[Criterion],
    req: &SubmitEvaluationRequest,
) -> Result<ValidatedSubmission, String> {
    let subject = req.subject.trim().to_ascii_uppercase();
    if subject.is_empty() {
        return Err("Subject is required".to_string());
    }
    if active_criteria.is_empty() {
        return Err("No evaluation criteria are configured".to_string());
    }

    let expected: HashSet<i64> = active_criteria.iter().map(|c| c.id).collect();
    let mut seen = HashSet::with_capacity(req.responses.len());
    let mut ratings = Vec::with_capacity(req.responses.len());

    for item in &req.responses {
        if !expected.contains(&item.criterion_id) {
            return Err(format!("Unknown criterion {}", item.criterion_id));
        }
        if !seen.insert(item.criterion_id) {
            return Err(format!("Criterion {} is rated more than once", item.criterion_id));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&item.rating) {
            return Err(format!(
                "Rating for criterion {} must be between {MIN_RATING} and {MAX_RATING}",
                item.criterion_id
            ));
        }
        ratings.push(RatingInput {
            criterion_id: item.criterion_id,
            rating: item.rating,
            comment: clean_comment(item.comment.as_deref())?,
        });
    }

    if seen.len() != expected.len() {
        return Err("Every evaluation criterion must be rated".to_string());
    }

    Ok(ValidatedSubmission {
        subject,
        ratings,
        comments: clean_comment(req.comments.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(id: i64) -> Criterion {
        let now = chrono::Utc::now();
        Criterion {
            id,
            title: format!("Criterion {id}"),
            description: None,
            category: None,
            sort_order: id as i32,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn rating(criterion_id: i64, rating: i32) -> RatingInput {
        RatingInput {
            criterion_id,
            rating,
            comment: None,
        }
    }

    fn request(responses: Vec<RatingInput>) -> SubmitEvaluationRequest {
        SubmitEvaluationRequest {
            faculty_id: 1,
            subject: " it101 ".to_string(),
            responses,
            comments: Some("  Great class  ".to_string()),
            is_anonymous: false,
        }
    }

    #[test]
    fn test_complete_submission_is_accepted() {
        let criteria = [criterion(1), criterion(2)];
        let ok = validate_submission(&criteria, &request(vec![rating(2, 5), rating(1, 1)])).unwrap();
        assert_eq!(ok.subject, "IT101");
        assert_eq!(ok.comments.as_deref(), Some("Great class"));
        assert_eq!(ok.ratings.len(), 2);
    }

    #[test]
    fn test_missing_criterion_is_rejected() {
        let criteria = [criterion(1), criterion(2)];
        let err = validate_submission(&criteria, &request(vec![rating(1, 4)])).unwrap_err();
        assert!(err.contains("Every evaluation criterion"));
    }

    #[test]
    fn test_duplicate_and_unknown_criteria_are_rejected() {
        let criteria = [criterion(1), criterion(2)];
        assert!(
            validate_submission(&criteria, &request(vec![rating(1, 4), rating(1, 3)])).is_err()
        );
        assert!(
            validate_submission(&criteria, &request(vec![rating(1, 4), rating(9, 3)])).is_err()
        );
    }

    #[test]
    fn test_rating_bounds() {
        let criteria = [criterion(1)];
        assert!(validate_submission(&criteria, &request(vec![rating(1, 0)])).is_err());
        assert!(validate_submission(&criteria, &request(vec![rating(1, 6)])).is_err());
        assert!(validate_submission(&criteria, &request(vec![rating(1, 1)])).is_ok());
        assert!(validate_submission(&criteria, &request(vec![rating(1, 5)])).is_ok());
    }

    #[test]
    fn test_blank_subject_is_rejected() {
        let criteria = [criterion(1)];
        let mut req = request(vec![rating(1, 3)]);
        req.subject = "   ".to_string();
        assert!(validate_submission(&criteria, &req).is_err());
    }
}
