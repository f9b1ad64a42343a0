use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradableMcq {
    pub id: Uuid,
    pub options: Vec<McqOption>,
    pub marks_on_correct: Option<Decimal>,
    pub negative_marks_on_wrong: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqOption {
    #[serde(default, alias = "isCorrect")]
    pub is_correct: bool,
}

impl GradableMcq {
    pub fn marks_on_correct(&self) -> Decimal {
        self.marks_on_correct.unwrap_or(Decimal::ONE)
    }

    pub fn negative_marks_on_wrong(&self) -> Decimal {
        self.negative_marks_on_wrong.unwrap_or(Decimal::ZERO)
    }
}
