// src/generation/normalizer.rs

//! Turns untrusted model text into question records.
//!
//! The pipeline is extract -> clean -> parse, and any failure lands on the
//! deterministic fallback. `normalize` never returns an error.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    generation::{
        cleanup::{clean, extract_candidate},
        fallback::fallback_records,
    },
    models::question::{QuestionKind, QuestionRecord},
};

/// What one normalization call is asked to produce.
#[derive(Debug, Clone, Copy)]
pub struct BatchSpec<'a> {
    pub kind: QuestionKind,
    pub count: u32,
    pub start_id: u32,
    pub topic: &'a str,
}

/// Text at each pipeline stage, kept for diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct StageTrace {
    pub raw: String,
    pub extracted: String,
    pub cleaned: String,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Records built from the model's own output.
    Parsed(Vec<QuestionRecord>),
    /// Placeholder records, with the reason parsing was abandoned.
    Fallback {
        records: Vec<QuestionRecord>,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct Normalization {
    pub outcome: Outcome,
    pub trace: StageTrace,
    /// Parsed records whose `correctAnswer` matched none of their options.
    pub mismatched_answers: usize,
    /// `null` entries removed from option lists. Every other option value is
    /// kept, in order.
    pub dropped_options: usize,
}

impl Normalization {
    pub fn records(&self) -> &[QuestionRecord] {
        match &self.outcome {
            Outcome::Parsed(records) => records,
            Outcome::Fallback { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<QuestionRecord> {
        match self.outcome {
            Outcome::Parsed(records) => records,
            Outcome::Fallback { records, .. } => records,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback { .. })
    }
}

/// Shape of one element of the model's JSON array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    #[serde(default)]
    options: Option<Vec<Value>>,
    #[serde(default, alias = "correct_answer")]
    correct_answer: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    points: Option<Value>,
}

/// Normalizes one model response for a single kind.
///
/// `raw` of `None` (no response at all) is treated like unparsable output.
pub fn normalize(raw: Option<&str>, spec: BatchSpec<'_>) -> Normalization {
    let raw_text = raw.unwrap_or_default();
    let mut trace = StageTrace {
        raw: raw_text.to_string(),
        ..Default::default()
    };

    if raw_text.trim().is_empty() {
        return fall_back(spec, trace, "empty model output".to_string());
    }

    trace.extracted = extract_candidate(raw_text);
    trace.cleaned = clean(&trace.extracted);

    let parsed: Vec<RawQuestion> = match serde_json::from_str(&trace.cleaned) {
        Ok(parsed) => parsed,
        Err(e) => return fall_back(spec, trace, e.to_string()),
    };

    if parsed.is_empty() {
        return fall_back(spec, trace, "model returned an empty question list".to_string());
    }

    let mut mismatched_answers = 0;
    let mut dropped_options = 0;
    let records = parsed
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let built = build_record(item, spec.kind, spec.start_id + index as u32);
            if built.mismatched_answer {
                mismatched_answers += 1;
            }
            dropped_options += built.dropped_options;
            built.record
        })
        .collect();

    Normalization {
        outcome: Outcome::Parsed(records),
        trace,
        mismatched_answers,
        dropped_options,
    }
}

fn fall_back(spec: BatchSpec<'_>, trace: StageTrace, error: String) -> Normalization {
    Normalization {
        outcome: Outcome::Fallback {
            records: fallback_records(spec.kind, spec.count, spec.start_id, spec.topic),
            error,
        },
        trace,
        mismatched_answers: 0,
        dropped_options: 0,
    }
}

struct BuiltRecord {
    record: QuestionRecord,
    mismatched_answer: bool,
    dropped_options: usize,
}

/// Builds a record and reports what had to be left out of it.
fn build_record(item: RawQuestion, kind: QuestionKind, id: u32) -> BuiltRecord {
    let points = points_or_default(item.points.as_ref(), kind);

    let mut dropped_options = 0;
    let (options, correct_answer, explanation, mismatched_answer) = match kind {
        QuestionKind::MultipleChoice => {
            let options: Option<Vec<String>> = item.options.map(|values| {
                let kept: Vec<String> = values.iter().filter_map(value_to_text).collect();
                dropped_options = values.len() - kept.len();
                kept
            });
            let answer = item.correct_answer.as_ref().and_then(value_to_text);
            let (answer, mismatched) = resolve_answer(answer, options.as_deref());
            (options, answer, item.explanation, mismatched)
        }
        QuestionKind::OpenEnded => (None, None, None, false),
    };

    let record = QuestionRecord {
        id,
        kind,
        prompt: item.question,
        options,
        correct_answer,
        explanation,
        points,
        required: true,
    };
    BuiltRecord {
        record,
        mismatched_answer,
        dropped_options,
    }
}

/// Zero, null, negative and non-numeric values all mean "use the default".
fn points_or_default(value: Option<&Value>, kind: QuestionKind) -> u32 {
    let points = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match points {
        Some(p) if p > 0 => u32::try_from(p).unwrap_or(u32::MAX),
        _ => kind.default_points(),
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Keeps an answer only when it names one of the options.
///
/// Exact matches win; otherwise a trimmed, case-insensitive match is mapped
/// back to the option's own text. Without options there is nothing to check.
fn resolve_answer(answer: Option<String>, options: Option<&[String]>) -> (Option<String>, bool) {
    let Some(answer) = answer else {
        return (None, false);
    };
    let Some(options) = options.filter(|o| !o.is_empty()) else {
        return (Some(answer), false);
    };

    if options.iter().any(|o| *o == answer) {
        return (Some(answer), false);
    }

    let wanted = answer.trim().to_lowercase();
    match options.iter().find(|o| o.trim().to_lowercase() == wanted) {
        Some(option) => (Some(option.clone()), false),
        None => (None, true),
    }
}
