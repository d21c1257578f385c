use chatbench_core::{
    tokens_per_second, BenchError, MeasurementRecord, Mode, PromptDefinition, Result, TrialMetrics,
};
use tracing::debug;

use crate::accumulator::accumulate;
use crate::client::{ChatBackend, ChatResponse};

/// Identity of one cell in the trial matrix.
#[derive(Debug, Clone, Copy)]
pub struct Trial<'a> {
    pub provider: &'a str,
    pub prompt: &'a PromptDefinition,
    /// 1-based.
    pub iteration: u32,
}

impl<'a> Trial<'a> {
    /// Model requested for this trial, before the backend resolves aliases.
    pub fn nominal_model(&self) -> &'a str {
        self.prompt.options.model.as_deref().unwrap_or("unknown")
    }

    pub fn failure(&self, error: &BenchError) -> MeasurementRecord {
        MeasurementRecord::failure(
            self.provider,
            self.nominal_model(),
            self.prompt.name.clone(),
            self.iteration,
            error.to_string(),
        )
    }
}

/// Execute one attempt over the requested path. No retries.
pub async fn run_trial<C>(client: &C, trial: &Trial<'_>, mode: Mode) -> Result<MeasurementRecord>
where
    C: ChatBackend + ?Sized,
{
    debug!(
        provider = trial.provider,
        prompt = %trial.prompt.name,
        iteration = trial.iteration,
        %mode,
        "Running trial"
    );

    match mode {
        Mode::Streaming => run_streaming(client, trial).await,
        Mode::Static => run_single_shot(client, trial).await,
    }
}

pub async fn run_single_shot<C>(client: &C, trial: &Trial<'_>) -> Result<MeasurementRecord>
where
    C: ChatBackend + ?Sized,
{
    let response = client
        .chat(trial.provider, &trial.prompt.messages, &trial.prompt.options)
        .await?;
    Ok(record_from_response(trial, response))
}

pub async fn run_streaming<C>(client: &C, trial: &Trial<'_>) -> Result<MeasurementRecord>
where
    C: ChatBackend + ?Sized,
{
    let events = client
        .stream(trial.provider, &trial.prompt.messages, &trial.prompt.options)
        .await?;
    accumulate(events, trial).await
}

/// Map a blocking response envelope straight onto a record.
pub fn record_from_response(trial: &Trial<'_>, response: ChatResponse) -> MeasurementRecord {
    let usage = response.usage.unwrap_or_default();
    let latency_ms = response.timing.latency_ms;

    let metrics = TrialMetrics {
        latency_ms,
        ttft_ms: None,
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        tokens_per_second: tokens_per_second(usage.completion_tokens, latency_ms),
        response_length: response.content.chars().count(),
        response_content: Some(response.content),
        messages: Some(trial.prompt.messages.clone()),
    };

    MeasurementRecord::success(
        response.provider,
        response.model,
        trial.prompt.name.clone(),
        trial.iteration,
        metrics,
    )
}
