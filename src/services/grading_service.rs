use crate::models::mcq::GradableMcq;
use crate::models::progress::McqAnswer;
use crate::models::result::McqAnswerDetail;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

pub struct GradingService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredSelection {
    pub is_correct: bool,
    pub marks_awarded: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct McqReconciliation {
    pub score: Decimal,
    pub details: Vec<McqAnswerDetail>,
}

impl GradingService {
    /// All-or-nothing: the selection must match the correct option set
    /// exactly. A wrong selection costs `negative_marks_on_wrong`.
    pub fn score_selection(selected: &[i32], mcq: &GradableMcq) -> ScoredSelection {
        let chosen: BTreeSet<i32> = selected.iter().copied().collect();
        let correct: BTreeSet<i32> = mcq
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_correct)
            .map(|(idx, _)| idx as i32)
            .collect();

        if chosen == correct {
            ScoredSelection {
                is_correct: true,
                marks_awarded: mcq.marks_on_correct(),
            }
        } else {
            let penalty = mcq.negative_marks_on_wrong();
            ScoredSelection {
                is_correct: false,
                marks_awarded: if penalty.is_zero() { Decimal::ZERO } else { -penalty },
            }
        }
    }

    /// Scores answers in submission order. Answers whose question is not in
    /// `questions` are dropped from both the score and the details.
    pub fn reconcile_mcq(
        answers: &[McqAnswer],
        questions: &HashMap<Uuid, GradableMcq>,
    ) -> McqReconciliation {
        let mut score = Decimal::ZERO;
        let mut details = Vec::with_capacity(answers.len());

        for answer in answers {
            let Some(mcq) = questions.get(&answer.question_id) else {
                tracing::warn!(
                    question_id = %answer.question_id,
                    "MCQ answer references an unknown question, excluding it"
                );
                continue;
            };

            let scored = Self::score_selection(&answer.selected_option_indices, mcq);
            score += scored.marks_awarded;

            let selected: BTreeSet<i32> = answer.selected_option_indices.iter().copied().collect();
            details.push(McqAnswerDetail {
                question_id: answer.question_id,
                selected_option_indices: selected.into_iter().collect(),
                is_correct: scored.is_correct,
                marks_awarded: scored.marks_awarded,
            });
        }

        McqReconciliation { score, details }
    }
}
