use crate::database::store::AggregationStore;
use crate::error::{Error, Result};
use crate::models::mcq::GradableMcq;
use crate::models::progress::{Progress, ProgressStatus};
use crate::models::result::ContestResult;
use crate::services::grading_service::{GradingService, McqReconciliation};
use crate::services::submission_service::{CodingReconciliation, SubmissionService};
use crate::utils::time::elapsed_seconds;
use std::collections::HashMap;
use uuid::Uuid;

pub struct ResultService;

impl ResultService {
    /// Pulls the questions and accepted attempts a progress record refers to
    /// and compiles its result. Nothing is written.
    pub async fn build<S>(store: &S, progress: &Progress) -> Result<ContestResult>
    where
        S: AggregationStore + ?Sized,
    {
        ensure_submitted(progress)?;

        let mut question_ids: Vec<Uuid> = progress
            .mcq_answers
            .iter()
            .map(|a| a.question_id)
            .collect();
        question_ids.sort_unstable();
        question_ids.dedup();

        let questions: HashMap<Uuid, GradableMcq> = store
            .fetch_mcqs(question_ids)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();
        let mcq = GradingService::reconcile_mcq(&progress.mcq_answers, &questions);

        let attempts = store
            .fetch_accepted_attempts(progress.contest_id, progress.user_id)
            .await?;
        let coding = SubmissionService::reconcile_coding(&attempts);

        Self::compile(progress, mcq, coding)
    }

    pub fn compile(
        progress: &Progress,
        mcq: McqReconciliation,
        coding: CodingReconciliation,
    ) -> Result<ContestResult> {
        ensure_submitted(progress)?;

        Ok(ContestResult {
            contest_id: progress.contest_id,
            user_id: progress.user_id,
            total_score: mcq.score + coding.score,
            mcq_score: mcq.score,
            mcq_answer_details: mcq.details,
            coding_score: coding.score,
            coding_submission_details: coding.details,
            time_taken_seconds: Self::time_taken_seconds(progress),
            started_at: progress.started_at,
            submitted_at: progress.submitted_at,
            status: progress.status,
        })
    }

    /// Recorded time wins when it is positive, then wall-clock between start
    /// and submit, then zero.
    pub fn time_taken_seconds(progress: &Progress) -> i64 {
        if let Some(spent) = progress.total_time_spent.filter(|&s| s > 0) {
            return spent;
        }

        elapsed_seconds(progress.started_at, progress.submitted_at).unwrap_or_else(|| {
            tracing::warn!(
                contest_id = %progress.contest_id,
                user_id = %progress.user_id,
                started_at = ?progress.started_at,
                submitted_at = ?progress.submitted_at,
                "Cannot derive time taken, recording 0"
            );
            0
        })
    }
}

fn ensure_submitted(progress: &Progress) -> Result<()> {
    if progress.status != ProgressStatus::Submitted {
        return Err(Error::InvalidState(format!(
            "progress {} is {}, expected SUBMITTED",
            progress.key(),
            progress.status.as_str()
        )));
    }
    Ok(())
}
