use crate::database::store::{AggregationStore, InsertOutcome};
use crate::error::{Error, Result};
use crate::models::mcq::GradableMcq;
use crate::models::progress::{Progress, ProgressKey, ProgressStatus};
use crate::models::result::ContestResult;
use crate::models::submission::SubmissionAttempt;
use async_trait::async_trait;
use std::collections::{btree_map::Entry, BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store. Attempts keep insertion order, which stands in
/// for the upstream encounter order.
#[derive(Default)]
pub struct InMemoryStore {
    progress: RwLock<BTreeMap<ProgressKey, Progress>>,
    mcqs: RwLock<HashMap<Uuid, GradableMcq>>,
    attempts: RwLock<Vec<SubmissionAttempt>>,
    results: RwLock<BTreeMap<ProgressKey, ContestResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_progress(&self, progress: Progress) {
        self.progress.write().await.insert(progress.key(), progress);
    }

    pub async fn put_mcq(&self, mcq: GradableMcq) {
        self.mcqs.write().await.insert(mcq.id, mcq);
    }

    pub async fn put_attempt(&self, attempt: SubmissionAttempt) {
        self.attempts.write().await.push(attempt);
    }

    pub async fn results(&self) -> Vec<ContestResult> {
        self.results.read().await.values().cloned().collect()
    }

    pub async fn result(&self, key: ProgressKey) -> Option<ContestResult> {
        self.results.read().await.get(&key).cloned()
    }
}

#[async_trait]
impl AggregationStore for InMemoryStore {
    async fn list_submitted_keys(&self, contest_id: Option<Uuid>) -> Result<Vec<ProgressKey>> {
        Ok(self
            .progress
            .read()
            .await
            .values()
            .filter(|p| p.status == ProgressStatus::Submitted)
            .filter(|p| contest_id.map_or(true, |id| p.contest_id == id))
            .map(Progress::key)
            .collect())
    }

    async fn load_progress(&self, key: ProgressKey) -> Result<Progress> {
        self.progress
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("progress {}", key)))
    }

    async fn fetch_mcqs(&self, ids: Vec<Uuid>) -> Result<Vec<GradableMcq>> {
        let mcqs = self.mcqs.read().await;
        Ok(ids.iter().filter_map(|id| mcqs.get(id).cloned()).collect())
    }

    async fn fetch_accepted_attempts(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmissionAttempt>> {
        Ok(self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.contest_id == contest_id && a.user_id == user_id)
            .filter(|a| a.verdict.is_accepted())
            .cloned()
            .collect())
    }

    async fn result_exists(&self, contest_id: Uuid, user_id: Uuid) -> Result<bool> {
        let key = ProgressKey { contest_id, user_id };
        Ok(self.results.read().await.contains_key(&key))
    }

    async fn insert_result(&self, result: &ContestResult) -> Result<InsertOutcome> {
        match self.results.write().await.entry(result.key()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(result.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }
}
