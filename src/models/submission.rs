use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Judge verdict. Only `Accepted` matters for scoring; anything the judge
/// reports that we do not recognise is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    RuntimeError,
    CompilationError,
    Pending,
    Other(String),
}

/// Normalised (trimmed, upper-cased) spellings the judge uses for an
/// accepted verdict. Store-side filters must match on exactly this set.
pub const ACCEPTED_VERDICT_CODES: &[&str] = &["ACCEPTED", "AC"];

impl Verdict {
    pub fn parse(s: &str) -> Self {
        let normalised = s.trim().to_ascii_uppercase();
        if ACCEPTED_VERDICT_CODES.contains(&normalised.as_str()) {
            return Self::Accepted;
        }
        match normalised.as_str() {
            "WRONG_ANSWER" | "WA" => Self::WrongAnswer,
            "TIME_LIMIT_EXCEEDED" | "TLE" => Self::TimeLimitExceeded,
            "RUNTIME_ERROR" | "RE" => Self::RuntimeError,
            "COMPILATION_ERROR" | "CE" => Self::CompilationError,
            "PENDING" => Self::Pending,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// One graded submission for one coding problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contest_id: Uuid,
    pub problem_id: Uuid,
    pub verdict: Verdict,
    pub score: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parsing_recognises_short_codes() {
        assert_eq!(Verdict::parse("accepted"), Verdict::Accepted);
        assert_eq!(Verdict::parse("WA"), Verdict::WrongAnswer);
        assert_eq!(
            Verdict::parse("MEMORY_LIMIT"),
            Verdict::Other("MEMORY_LIMIT".to_string())
        );
        assert!(!Verdict::parse("pending").is_accepted());
    }

    #[test]
    fn accepted_codes_and_parser_agree() {
        for code in ACCEPTED_VERDICT_CODES {
            assert!(Verdict::parse(code).is_accepted());
            assert!(Verdict::parse(&format!(" {} ", code.to_ascii_lowercase())).is_accepted());
        }
        for other in ["WRONG_ANSWER", "WA", "TLE", "PENDING", "ACCEPTED_PARTIAL", ""] {
            assert!(!Verdict::parse(other).is_accepted());
            assert!(!ACCEPTED_VERDICT_CODES.contains(&other));
        }
    }
}
