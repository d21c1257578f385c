use serde::{Deserialize, Serialize};

use crate::ChatMessage;

/// Outcome of one trial: one prompt, one iteration, one provider/model, one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    /// 1-based.
    pub iteration: u32,
    #[serde(flatten)]
    pub outcome: TrialOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialOutcome {
    Success(TrialMetrics),
    Failure { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialMetrics {
    pub latency_ms: f64,
    /// Only set for streamed trials that received at least one delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttft_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_second: Option<f64>,
    /// Character count of the response text.
    pub response_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

/// Completion throughput in tokens per second.
///
/// Undefined when the completion count is missing or zero, or when the latency
/// is not positive. Both execution paths (single-shot and streamed) derive the
/// value here.
pub fn tokens_per_second(completion_tokens: Option<u32>, latency_ms: f64) -> Option<f64> {
    match completion_tokens {
        Some(tokens) if tokens > 0 && latency_ms > 0.0 => {
            Some(tokens as f64 / latency_ms * 1000.0)
        }
        _ => None,
    }
}

impl MeasurementRecord {
    pub fn success(
        provider: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
        iteration: u32,
        metrics: TrialMetrics,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            prompt: prompt.into(),
            iteration,
            outcome: TrialOutcome::Success(metrics),
        }
    }

    pub fn failure(
        provider: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
        iteration: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            prompt: prompt.into(),
            iteration,
            outcome: TrialOutcome::Failure {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Success(_))
    }

    pub fn metrics(&self) -> Option<&TrialMetrics> {
        match &self.outcome {
            TrialOutcome::Success(m) => Some(m),
            TrialOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TrialOutcome::Success(_) => None,
            TrialOutcome::Failure { error } => Some(error),
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        self.metrics().map(|m| m.latency_ms)
    }

    pub fn ttft_ms(&self) -> Option<f64> {
        self.metrics().and_then(|m| m.ttft_ms)
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        self.metrics().and_then(|m| m.tokens_per_second)
    }

    /// Zero for failed trials.
    pub fn response_length(&self) -> usize {
        self.metrics().map_or(0, |m| m.response_length)
    }
}
