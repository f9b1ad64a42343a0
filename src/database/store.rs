use crate::error::Result;
use crate::models::mcq::GradableMcq;
use crate::models::progress::{Progress, ProgressKey};
use crate::models::result::ContestResult;
use crate::models::submission::SubmissionAttempt;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Upstream reads and the single write the aggregation engine performs.
#[async_trait]
pub trait AggregationStore: Send + Sync {
    /// Keys of submitted progress records, optionally restricted to one contest.
    async fn list_submitted_keys(&self, contest_id: Option<Uuid>) -> Result<Vec<ProgressKey>>;

    async fn load_progress(&self, key: ProgressKey) -> Result<Progress>;

    /// Questions that resolve; unknown or undecodable ids are simply absent.
    async fn fetch_mcqs(&self, ids: Vec<Uuid>) -> Result<Vec<GradableMcq>>;

    /// Accepted attempts for one participant, in the store's encounter order.
    async fn fetch_accepted_attempts(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmissionAttempt>>;

    async fn result_exists(&self, contest_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Atomic insert-if-absent on `(contest_id, user_id)`.
    async fn insert_result(&self, result: &ContestResult) -> Result<InsertOutcome>;
}
