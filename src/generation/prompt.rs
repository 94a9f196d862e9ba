// src/generation/prompt.rs

use crate::models::question::QuestionKind;

/// Builds the instruction sent to the model for one question kind.
pub fn build_prompt(
    kind: QuestionKind,
    count: u32,
    topic: &str,
    reference_material: Option<&str>,
) -> String {
    let (description, schema) = match kind {
        QuestionKind::MultipleChoice => (
            "multiple-choice questions, each with exactly 4 options and one correct answer",
            r#"[{"question": "...", "options": ["...", "...", "...", "..."], "correctAnswer": "<one of the options, verbatim>", "explanation": "...", "points": 1}]"#,
        ),
        QuestionKind::OpenEnded => (
            "open-ended questions that require a written answer",
            r#"[{"question": "...", "points": 2}]"#,
        ),
    };

    let mut prompt = format!(
        "You are an experienced teacher writing an assessment.\n\
         Generate exactly {count} {description} about \"{topic}\".\n\
         Respond with a JSON array only, no prose and no markdown, in this format:\n\
         {schema}\n\
         Do not put code blocks or backticks inside the question text."
    );

    if let Some(material) = reference_material.map(str::trim).filter(|m| !m.is_empty()) {
        prompt.push_str("\n\nBase the questions on the following reference material:\n");
        prompt.push_str(material);
    }

    prompt
}
