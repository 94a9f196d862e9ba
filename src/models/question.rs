// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of question the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    OpenEnded,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::OpenEnded => "open-ended",
        }
    }

    /// Points given to a question of this kind when the model supplies none.
    pub fn default_points(&self) -> u32 {
        match self {
            QuestionKind::MultipleChoice => crate::config::DEFAULT_MC_POINTS,
            QuestionKind::OpenEnded => crate::config::DEFAULT_OPEN_POINTS,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, generated question.
///
/// Created either from parsed model output or by the fallback generator.
/// `options`, `correct_answer` and `explanation` only ever appear on
/// multiple-choice records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Position in the batch, assigned from the caller's counter.
    pub id: u32,

    pub kind: QuestionKind,

    /// The question text.
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    pub points: u32,

    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&QuestionKind::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple-choice\"");
        let kind: QuestionKind = serde_json::from_str("\"open-ended\"").unwrap();
        assert_eq!(kind, QuestionKind::OpenEnded);
    }

    #[test]
    fn test_open_ended_record_omits_choice_fields() {
        let record = QuestionRecord {
            id: 3,
            kind: QuestionKind::OpenEnded,
            prompt: "Explain recursion".to_string(),
            options: None,
            correct_answer: None,
            explanation: None,
            points: 2,
            required: true,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("options").is_none());
        assert!(value.get("correctAnswer").is_none());
        assert_eq!(value["kind"], "open-ended");
        assert_eq!(value["points"], 2);
    }
}
