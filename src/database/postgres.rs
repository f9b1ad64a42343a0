use crate::database::store::{AggregationStore, InsertOutcome};
use crate::error::{Error, Result};
use crate::models::mcq::{GradableMcq, McqOption};
use crate::models::progress::{McqAnswer, Progress, ProgressKey, ProgressStatus};
use crate::models::result::ContestResult;
use crate::models::submission::{SubmissionAttempt, Verdict, ACCEPTED_VERDICT_CODES};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Reads the live-contest tables (`contest_progress`, `mcq_questions`,
/// `submissions`) and writes `contest_results`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProgressRow {
    contest_id: Uuid,
    user_id: Uuid,
    status: String,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    total_time_spent: Option<i64>,
    mcq_answers: Option<JsonValue>,
}

#[derive(Debug, FromRow)]
struct McqRow {
    id: Uuid,
    options: Option<JsonValue>,
    marks_on_correct: Option<Decimal>,
    negative_marks_on_wrong: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    user_id: Uuid,
    contest_id: Uuid,
    problem_id: Uuid,
    verdict: String,
    score: Decimal,
}

fn decode_progress(row: ProgressRow) -> Result<Progress> {
    let status: ProgressStatus = row.status.parse().map_err(Error::InvalidState)?;

    Ok(Progress {
        contest_id: row.contest_id,
        user_id: row.user_id,
        status,
        started_at: row.started_at,
        submitted_at: row.submitted_at,
        total_time_spent: row.total_time_spent,
        mcq_answers: decode_mcq_answers(row.mcq_answers)?,
    })
}

/// The column must hold an array; individual entries that do not decode
/// are dropped with a warning.
fn decode_mcq_answers(raw: Option<JsonValue>) -> Result<Vec<McqAnswer>> {
    let entries: Vec<JsonValue> = match raw {
        Some(JsonValue::Null) | None => return Ok(Vec::new()),
        Some(v) => serde_json::from_value(v)?,
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<McqAnswer>(entry) {
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed MCQ answer entry");
                None
            }
        })
        .collect())
}

fn decode_mcq(row: McqRow) -> Option<GradableMcq> {
    let options: Vec<McqOption> = match row.options {
        Some(v) => match serde_json::from_value(v) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(question_id = %row.id, error = %e, "MCQ options are malformed, treating question as unresolved");
                return None;
            }
        },
        None => Vec::new(),
    };

    Some(GradableMcq {
        id: row.id,
        options,
        marks_on_correct: row.marks_on_correct,
        negative_marks_on_wrong: row.negative_marks_on_wrong,
    })
}

#[async_trait]
impl AggregationStore for PgStore {
    async fn list_submitted_keys(&self, contest_id: Option<Uuid>) -> Result<Vec<ProgressKey>> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT contest_id, user_id FROM contest_progress
            WHERE status = 'SUBMITTED'
              AND ($1::uuid IS NULL OR contest_id = $1)
            ORDER BY submitted_at ASC NULLS LAST, contest_id, user_id
            "#,
        )
        .bind(contest_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(contest_id, user_id)| ProgressKey { contest_id, user_id })
            .collect())
    }

    async fn load_progress(&self, key: ProgressKey) -> Result<Progress> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT contest_id, user_id, status, started_at, submitted_at,
                   total_time_spent::BIGINT AS total_time_spent,
                   mcq_answers
            FROM contest_progress
            WHERE contest_id = $1 AND user_id = $2
            "#,
        )
        .bind(key.contest_id)
        .bind(key.user_id)
        .fetch_one(&self.pool)
        .await?;

        decode_progress(row)
    }

    async fn fetch_mcqs(&self, ids: Vec<Uuid>) -> Result<Vec<GradableMcq>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, McqRow>(
            r#"
            SELECT id, options, marks_on_correct, negative_marks_on_wrong
            FROM mcq_questions
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(decode_mcq).collect())
    }

    async fn fetch_accepted_attempts(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmissionAttempt>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, user_id, contest_id, problem_id, verdict,
                   COALESCE(score, 0)::NUMERIC AS score
            FROM submissions
            WHERE contest_id = $1 AND user_id = $2 AND UPPER(TRIM(verdict)) = ANY($3)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .bind(ACCEPTED_VERDICT_CODES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SubmissionAttempt {
                id: row.id,
                user_id: row.user_id,
                contest_id: row.contest_id,
                problem_id: row.problem_id,
                verdict: Verdict::parse(&row.verdict),
                score: row.score,
            })
            .collect())
    }

    async fn result_exists(&self, contest_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM contest_results WHERE contest_id = $1 AND user_id = $2)"#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_result(&self, result: &ContestResult) -> Result<InsertOutcome> {
        let mcq_details = serde_json::to_value(&result.mcq_answer_details)?;
        let coding_details = serde_json::to_value(&result.coding_submission_details)?;

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO contest_results (
                contest_id, user_id, mcq_score, mcq_answer_details,
                coding_score, coding_submission_details, total_score,
                time_taken_seconds, started_at, submitted_at, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (contest_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(result.contest_id)
        .bind(result.user_id)
        .bind(result.mcq_score)
        .bind(mcq_details)
        .bind(result.coding_score)
        .bind(coding_details)
        .bind(result.total_score)
        .bind(result.time_taken_seconds)
        .bind(result.started_at)
        .bind(result.submitted_at)
        .bind(result.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(_) => InsertOutcome::Inserted,
            None => InsertOutcome::AlreadyExists,
        })
    }
}
