// src/generation/fallback.rs

use crate::models::question::{QuestionKind, QuestionRecord};

const PLACEHOLDER_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];

/// Synthesizes exactly `count` placeholder questions about `topic`.
///
/// Ids run from `start_id`; the question number in the text runs from 1.
pub fn fallback_records(
    kind: QuestionKind,
    count: u32,
    start_id: u32,
    topic: &str,
) -> Vec<QuestionRecord> {
    (0..count)
        .map(|offset| {
            let number = offset + 1;
            let (prompt, options) = match kind {
                QuestionKind::MultipleChoice => (
                    format!("Question {} about {}", number, topic),
                    Some(PLACEHOLDER_OPTIONS.iter().map(|o| o.to_string()).collect()),
                ),
                QuestionKind::OpenEnded => (
                    format!("Explain {} in detail (Question {})", topic, number),
                    None,
                ),
            };

            QuestionRecord {
                id: start_id + offset,
                kind,
                prompt,
                options,
                correct_answer: None,
                explanation: None,
                points: kind.default_points(),
                required: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_choice_placeholders() {
        let records = fallback_records(QuestionKind::MultipleChoice, 3, 1, "Geometry");
        let prompts: Vec<&str> = records.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(
            prompts,
            [
                "Question 1 about Geometry",
                "Question 2 about Geometry",
                "Question 3 about Geometry"
            ]
        );
        for record in &records {
            assert_eq!(record.options.as_ref().map(Vec::len), Some(4));
            assert!(record.correct_answer.is_none());
            assert_eq!(record.points, 1);
            assert!(record.required);
        }
    }

    #[test]
    fn test_open_ended_placeholders() {
        let records = fallback_records(QuestionKind::OpenEnded, 2, 10, "Rust");
        assert_eq!(records[0].prompt, "Explain Rust in detail (Question 1)");
        assert_eq!(records[1].prompt, "Explain Rust in detail (Question 2)");
        assert_eq!(records[0].id, 10);
        assert_eq!(records[1].id, 11);
        assert!(records.iter().all(|r| r.options.is_none() && r.points == 2));
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(fallback_records(QuestionKind::OpenEnded, 0, 1, "x").is_empty());
    }
}
