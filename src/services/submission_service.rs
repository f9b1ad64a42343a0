use crate::models::result::CodingSubmissionDetail;
use crate::models::submission::SubmissionAttempt;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub struct SubmissionService;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodingReconciliation {
    pub score: Decimal,
    pub details: Vec<CodingSubmissionDetail>,
}

impl SubmissionService {
    /// Picks the highest-scoring accepted attempt per problem. The output is
    /// ordered by the first accepted attempt seen for each problem, and a
    /// later attempt only replaces the current best when strictly greater.
    pub fn select_best_attempts(attempts: &[SubmissionAttempt]) -> Vec<SubmissionAttempt> {
        let mut best: Vec<&SubmissionAttempt> = Vec::new();
        let mut slot_by_problem: HashMap<_, usize> = HashMap::new();

        for attempt in attempts.iter().filter(|a| a.verdict.is_accepted()) {
            match slot_by_problem.get(&attempt.problem_id) {
                Some(&slot) => {
                    if attempt.score > best[slot].score {
                        best[slot] = attempt;
                    }
                }
                None => {
                    slot_by_problem.insert(attempt.problem_id, best.len());
                    best.push(attempt);
                }
            }
        }

        best.into_iter().cloned().collect()
    }

    pub fn reconcile_coding(attempts: &[SubmissionAttempt]) -> CodingReconciliation {
        let selected = Self::select_best_attempts(attempts);

        let score = selected.iter().map(|a| a.score).sum();
        let details = selected
            .into_iter()
            .map(|a| CodingSubmissionDetail {
                problem_id: a.problem_id,
                best_attempt_id: a.id,
                score: a.score,
                solved: true,
            })
            .collect();

        CodingReconciliation { score, details }
    }
}
