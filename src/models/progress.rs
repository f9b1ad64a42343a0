use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    InProgress,
    Submitted,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Submitted => "SUBMITTED",
        }
    }
}

impl std::str::FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "SUBMITTED" => Ok(Self::Submitted),
            other => Err(format!("unknown progress status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey {
    pub contest_id: Uuid,
    pub user_id: Uuid,
}

impl std::fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.contest_id, self.user_id)
    }
}

/// A participant's live or submitted state for one contest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub total_time_spent: Option<i64>,
    #[serde(default)]
    pub mcq_answers: Vec<McqAnswer>,
}

impl Progress {
    pub fn key(&self) -> ProgressKey {
        ProgressKey {
            contest_id: self.contest_id,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqAnswer {
    #[serde(alias = "questionId")]
    pub question_id: Uuid,
    #[serde(default, alias = "selectedOptionIndices", alias = "selectedOptions")]
    pub selected_option_indices: Vec<i32>,
    #[serde(default, alias = "timeSpentSeconds", alias = "timeSpent")]
    pub time_spent_seconds: i64,
}
