// src/generation/service.rs

use serde::Serialize;

use crate::{
    generation::{
        invoker::{InvokeError, ModelInvoker},
        normalizer::{BatchSpec, Normalization, Outcome, normalize},
        prompt::build_prompt,
        retry::{RetryPolicy, invoke_with_retry},
    },
    models::{
        question::{QuestionKind, QuestionRecord},
        test_set::GenerateTestRequest,
    },
};

/// Where the questions of one kind came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSource {
    Model,
    Fallback,
    Failed,
}

/// Per-kind outcome reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindReport {
    pub kind: QuestionKind,
    pub requested: u32,
    pub produced: u32,
    pub source: KindSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationBatch {
    /// Multiple-choice questions first, then open-ended.
    pub questions: Vec<QuestionRecord>,
    pub reports: Vec<KindReport>,
}

impl GenerationBatch {
    /// True when every requested kind failed outright.
    pub fn all_failed(&self) -> bool {
        !self.reports.is_empty() && self.reports.iter().all(|r| r.source == KindSource::Failed)
    }
}

/// Generates every requested kind and stitches the results together.
///
/// Both model calls run concurrently. Results are normalized in a fixed
/// order so ids stay contiguous from `start_id` across the whole batch.
pub async fn generate_batch(
    invoker: &dyn ModelInvoker,
    request: &GenerateTestRequest,
    policy: &RetryPolicy,
    start_id: u32,
) -> GenerationBatch {
    let topic = request.topic.trim();
    let material = request.reference_material.as_deref();

    let (mc_raw, open_raw) = tokio::join!(
        invoke_kind(
            invoker,
            QuestionKind::MultipleChoice,
            request.multiple_choice_count,
            topic,
            material,
            policy
        ),
        invoke_kind(
            invoker,
            QuestionKind::OpenEnded,
            request.open_ended_count,
            topic,
            material,
            policy
        ),
    );

    let mut batch = GenerationBatch::default();
    let mut next_id = start_id;

    let kinds = [
        (QuestionKind::MultipleChoice, request.multiple_choice_count, mc_raw),
        (QuestionKind::OpenEnded, request.open_ended_count, open_raw),
    ];

    for (kind, count, raw) in kinds {
        // Nothing was requested for this kind.
        let Some(raw) = raw else { continue };

        let spec = BatchSpec {
            kind,
            count,
            start_id: next_id,
            topic,
        };

        let (mut records, source, message) = match raw {
            Ok(text) => {
                let normalization = normalize(Some(&text), spec);
                log_normalization(kind, &normalization);
                match normalization.outcome {
                    Outcome::Parsed(records) => (records, KindSource::Model, None),
                    Outcome::Fallback { records, error } => {
                        (records, KindSource::Fallback, Some(error))
                    }
                }
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    "Model unavailable for {} questions, using placeholders: {}",
                    kind,
                    e
                );
                let normalization = normalize(None, spec);
                (normalization.into_records(), KindSource::Fallback, Some(e.to_string()))
            }
            Err(e) => {
                tracing::error!("Generation failed for {} questions: {}", kind, e);
                (Vec::new(), KindSource::Failed, Some(e.to_string()))
            }
        };

        records.truncate(count as usize);
        next_id += records.len() as u32;

        batch.reports.push(KindReport {
            kind,
            requested: count,
            produced: records.len() as u32,
            source,
            message,
        });
        batch.questions.extend(records);
    }

    batch
}

async fn invoke_kind(
    invoker: &dyn ModelInvoker,
    kind: QuestionKind,
    count: u32,
    topic: &str,
    material: Option<&str>,
    policy: &RetryPolicy,
) -> Option<Result<String, InvokeError>> {
    if count == 0 {
        return None;
    }
    let prompt = build_prompt(kind, count, topic, material);
    Some(invoke_with_retry(invoker, &prompt, policy).await)
}

fn log_normalization(kind: QuestionKind, normalization: &Normalization) {
    match &normalization.outcome {
        Outcome::Parsed(records) => {
            tracing::info!("Parsed {} {} questions from model output", records.len(), kind);
            if normalization.mismatched_answers > 0 {
                tracing::warn!(
                    "Dropped {} {} answers that matched no option",
                    normalization.mismatched_answers,
                    kind
                );
            }
            if normalization.dropped_options > 0 {
                tracing::warn!(
                    "Dropped {} null {} options",
                    normalization.dropped_options,
                    kind
                );
            }
        }
        Outcome::Fallback { error, .. } => {
            tracing::warn!("Unparsable {} output, using placeholders: {}", kind, error);
            tracing::debug!(
                "raw={:?} extracted={:?} cleaned={:?}",
                normalization.trace.raw,
                normalization.trace.extracted,
                normalization.trace.cleaned
            );
        }
    }
}
