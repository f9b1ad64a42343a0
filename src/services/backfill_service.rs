use crate::database::store::{AggregationStore, InsertOutcome};
use crate::error::{Error, Result};
use crate::models::progress::ProgressKey;
use crate::services::result_service::ResultService;
use crate::utils::time::now;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub concurrency: usize,
    pub contest_id: Option<Uuid>,
    pub dry_run: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            contest_id: None,
            dry_run: false,
        }
    }
}

impl From<&crate::config::Config> for BackfillOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            concurrency: config.backfill_concurrency,
            contest_id: config.backfill_contest_id,
            dry_run: config.backfill_dry_run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillSummary {
    #[serde(rename = "created_count")]
    pub created: usize,
    #[serde(rename = "skipped_count")]
    pub skipped: usize,
    #[serde(rename = "failed_count")]
    pub failed: usize,
    pub dry_run: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BackfillSummary {
    fn start(dry_run: bool) -> Self {
        let started_at = now();
        Self {
            created: 0,
            skipped: 0,
            failed: 0,
            dry_run,
            cancelled: false,
            started_at,
            finished_at: started_at,
        }
    }

    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}

/// Compiles a result for every submitted progress record that lacks one.
pub struct BackfillService<S> {
    store: Arc<S>,
    options: BackfillOptions,
}

impl<S> BackfillService<S>
where
    S: AggregationStore + 'static,
{
    pub fn new(store: Arc<S>, options: BackfillOptions) -> Self {
        Self { store, options }
    }

    /// Runs one pass. Record-level failures are counted; an unreachable
    /// store aborts the run once in-flight records have drained.
    pub async fn run(&self, cancel: CancellationToken) -> Result<BackfillSummary> {
        let mut summary = BackfillSummary::start(self.options.dry_run);
        let keys = self
            .store
            .list_submitted_keys(self.options.contest_id)
            .await?;

        info!(
            eligible = keys.len(),
            concurrency = self.options.concurrency,
            contest_id = ?self.options.contest_id,
            dry_run = self.options.dry_run,
            "Starting result backfill"
        );

        let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks: JoinSet<(ProgressKey, Result<RecordOutcome>)> = JoinSet::new();
        let mut fatal: Option<Error> = None;

        for key in keys {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                permit = Arc::clone(&permits).acquire_owned() => {
                    permit.map_err(|e| Error::Internal(e.to_string()))?
                }
            };

            while let Some(joined) = tasks.try_join_next() {
                absorb(joined, &mut summary, &mut fatal);
            }
            if fatal.is_some() {
                break;
            }

            let store = Arc::clone(&self.store);
            let dry_run = self.options.dry_run;
            tasks.spawn(async move {
                let _permit = permit;
                (key, process_record(store.as_ref(), key, dry_run).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            absorb(joined, &mut summary, &mut fatal);
        }

        if let Some(e) = fatal {
            error!(
                error = %e,
                created = summary.created,
                skipped = summary.skipped,
                failed = summary.failed,
                "Result backfill aborted"
            );
            return Err(e);
        }

        summary.finished_at = now();
        if summary.cancelled {
            warn!(processed = summary.processed(), "Result backfill stopped before completion");
        }
        info!(
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "Result backfill finished"
        );
        Ok(summary)
    }
}

fn absorb(
    joined: std::result::Result<(ProgressKey, Result<RecordOutcome>), JoinError>,
    summary: &mut BackfillSummary,
    fatal: &mut Option<Error>,
) {
    match joined {
        Ok((key, Ok(outcome))) => {
            debug!(%key, ?outcome, "Record reconciled");
            summary.record(outcome);
        }
        Ok((key, Err(e))) if e.is_fatal() => {
            error!(%key, error = ?e, "Store unavailable while reconciling record");
            if fatal.is_none() {
                *fatal = Some(e);
            }
        }
        Ok((key, Err(e))) => {
            error!(%key, error = ?e, "Failed to compile result");
            summary.record(RecordOutcome::Failed);
        }
        Err(e) => {
            error!(error = ?e, "Backfill worker panicked");
            summary.record(RecordOutcome::Failed);
        }
    }
}

/// Takes a single record to its terminal state.
pub async fn process_record<S>(store: &S, key: ProgressKey, dry_run: bool) -> Result<RecordOutcome>
where
    S: AggregationStore + ?Sized,
{
    if store.result_exists(key.contest_id, key.user_id).await? {
        return Ok(RecordOutcome::Skipped);
    }

    let progress = store.load_progress(key).await?;
    let result = ResultService::build(store, &progress).await?;

    if dry_run {
        info!(
            %key,
            total_score = %result.total_score,
            "Dry run: result would be created"
        );
        return Ok(RecordOutcome::Created);
    }

    match store.insert_result(&result).await? {
        InsertOutcome::Inserted => Ok(RecordOutcome::Created),
        InsertOutcome::AlreadyExists => {
            debug!(%key, "Result inserted concurrently, skipping");
            Ok(RecordOutcome::Skipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mcq::GradableMcq;
    use crate::models::progress::{Progress, ProgressStatus};
    use crate::models::result::ContestResult;
    use crate::models::submission::SubmissionAttempt;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Store {}

        #[async_trait]
        impl AggregationStore for Store {
            async fn list_submitted_keys(&self, contest_id: Option<Uuid>) -> Result<Vec<ProgressKey>>;
            async fn load_progress(&self, key: ProgressKey) -> Result<Progress>;
            async fn fetch_mcqs(&self, ids: Vec<Uuid>) -> Result<Vec<GradableMcq>>;
            async fn fetch_accepted_attempts(
                &self,
                contest_id: Uuid,
                user_id: Uuid,
            ) -> Result<Vec<SubmissionAttempt>>;
            async fn result_exists(&self, contest_id: Uuid, user_id: Uuid) -> Result<bool>;
            async fn insert_result(&self, result: &ContestResult) -> Result<InsertOutcome>;
        }
    }

    fn key() -> ProgressKey {
        ProgressKey {
            contest_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
    }

    fn submitted(key: ProgressKey) -> Progress {
        let at = now();
        Progress {
            contest_id: key.contest_id,
            user_id: key.user_id,
            status: ProgressStatus::Submitted,
            started_at: Some(at),
            submitted_at: Some(at),
            total_time_spent: Some(60),
            mcq_answers: Vec::new(),
        }
    }

    fn stub_upstream(store: &mut MockStore) {
        store.expect_fetch_mcqs().returning(|_| Ok(Vec::new()));
        store
            .expect_fetch_accepted_attempts()
            .returning(|_, _| Ok(Vec::new()));
        store
            .expect_load_progress()
            .returning(|key| Ok(submitted(key)));
    }

    #[tokio::test]
    async fn existing_result_is_skipped_without_compiling() {
        let k = key();
        let mut store = MockStore::new();
        store
            .expect_result_exists()
            .with(eq(k.contest_id), eq(k.user_id))
            .returning(|_, _| Ok(true));
        store.expect_load_progress().never();
        store.expect_insert_result().never();

        let outcome = process_record(&store, k, false).await.unwrap();
        assert_eq!(outcome, RecordOutcome::Skipped);
    }

    #[tokio::test]
    async fn lost_insert_race_counts_as_skipped() {
        let mut store = MockStore::new();
        stub_upstream(&mut store);
        store.expect_result_exists().returning(|_, _| Ok(false));
        store
            .expect_insert_result()
            .times(1)
            .returning(|_| Ok(InsertOutcome::AlreadyExists));

        let outcome = process_record(&store, key(), false).await.unwrap();
        assert_eq!(outcome, RecordOutcome::Skipped);
    }

    #[tokio::test]
    async fn dry_run_never_inserts() {
        let mut store = MockStore::new();
        stub_upstream(&mut store);
        store.expect_result_exists().returning(|_, _| Ok(false));
        store.expect_insert_result().never();

        let outcome = process_record(&store, key(), true).await.unwrap();
        assert_eq!(outcome, RecordOutcome::Created);
    }

    #[tokio::test]
    async fn record_errors_are_isolated() {
        let good = key();
        let bad = key();
        let mut store = MockStore::new();
        store
            .expect_list_submitted_keys()
            .returning(move |_| Ok(vec![bad, good]));
        store.expect_result_exists().returning(|_, _| Ok(false));
        store.expect_load_progress().returning(move |k| {
            if k == bad {
                Err(Error::InvalidState("answers column is not an array".into()))
            } else {
                Ok(submitted(k))
            }
        });
        store.expect_fetch_mcqs().returning(|_| Ok(Vec::new()));
        store
            .expect_fetch_accepted_attempts()
            .returning(|_, _| Ok(Vec::new()));
        store
            .expect_insert_result()
            .withf(move |r| r.key() == good)
            .times(1)
            .returning(|_| Ok(InsertOutcome::Inserted));

        let service = BackfillService::new(Arc::new(store), BackfillOptions::default());
        let summary = service.run(CancellationToken::new()).await.unwrap();
        assert_eq!((summary.created, summary.skipped, summary.failed), (1, 0, 1));
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn unavailable_store_aborts_the_run() {
        let keys = vec![key(), key(), key()];
        let mut store = MockStore::new();
        let listed = keys.clone();
        store
            .expect_list_submitted_keys()
            .returning(move |_| Ok(listed.clone()));
        store
            .expect_result_exists()
            .returning(|_, _| Err(Error::Unavailable("connection refused".into())));

        let service = BackfillService::new(Arc::new(store), BackfillOptions::default());
        let err = service.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn listing_failure_is_propagated() {
        let mut store = MockStore::new();
        store
            .expect_list_submitted_keys()
            .returning(|_| Err(Error::Unavailable("pool closed".into())));

        let service = BackfillService::new(Arc::new(store), BackfillOptions::default());
        tokio_test::assert_err!(service.run(CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn cancelled_run_dispatches_nothing() {
        let mut store = MockStore::new();
        store
            .expect_list_submitted_keys()
            .returning(|_| Ok(vec![key(), key()]));
        store.expect_result_exists().never();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let service = BackfillService::new(Arc::new(store), BackfillOptions::default());
        let summary = tokio_test::assert_ok!(service.run(cancel).await);
        assert!(summary.cancelled);
        assert_eq!(summary.processed(), 0);
    }

    #[tokio::test]
    async fn cancellation_mid_run_drains_in_flight_record() {
        let first = key();
        let rest = [key(), key(), key()];
        let cancel = CancellationToken::new();

        let mut store = MockStore::new();
        store
            .expect_list_submitted_keys()
            .returning(move |_| Ok([&[first][..], &rest[..]].concat()));
        store
            .expect_result_exists()
            .with(eq(first.contest_id), eq(first.user_id))
            .times(1)
            .returning(|_, _| Ok(false));
        store.expect_fetch_mcqs().returning(|_| Ok(Vec::new()));
        store
            .expect_fetch_accepted_attempts()
            .returning(|_, _| Ok(Vec::new()));
        store
            .expect_load_progress()
            .with(eq(first))
            .times(1)
            .returning(|k| Ok(submitted(k)));
        let trigger = cancel.clone();
        store
            .expect_insert_result()
            .withf(move |r| r.key() == first)
            .times(1)
            .returning(move |_| {
                trigger.cancel();
                Ok(InsertOutcome::Inserted)
            });

        let service = BackfillService::new(Arc::new(store), BackfillOptions::default());
        let summary = service.run(cancel).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!((summary.created, summary.skipped, summary.failed), (1, 0, 0));
        assert_eq!(summary.processed(), 1);
    }

    #[test]
    fn summary_serializes_operator_field_names() {
        let mut summary = BackfillSummary::start(false);
        summary.record(RecordOutcome::Created);
        summary.record(RecordOutcome::Skipped);
        summary.record(RecordOutcome::Skipped);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["created_count"], 1);
        assert_eq!(json["skipped_count"], 2);
        assert_eq!(json["failed_count"], 0);
    }
}
