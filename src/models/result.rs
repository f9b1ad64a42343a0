use crate::models::progress::{ProgressKey, ProgressStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The compiled scoring record for one participant's contest attempt.
/// Unique per `(contest_id, user_id)` and written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestResult {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub mcq_score: Decimal,
    pub mcq_answer_details: Vec<McqAnswerDetail>,
    pub coding_score: Decimal,
    pub coding_submission_details: Vec<CodingSubmissionDetail>,
    pub total_score: Decimal,
    pub time_taken_seconds: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: ProgressStatus,
}

impl ContestResult {
    pub fn key(&self) -> ProgressKey {
        ProgressKey {
            contest_id: self.contest_id,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqAnswerDetail {
    pub question_id: Uuid,
    pub selected_option_indices: Vec<i32>,
    pub is_correct: bool,
    pub marks_awarded: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingSubmissionDetail {
    pub problem_id: Uuid,
    pub best_attempt_id: Uuid,
    pub score: Decimal,
    pub solved: bool,
}
