use chatbench_core::{tokens_per_second, BenchError, MeasurementRecord, Result, TrialMetrics};
use futures::{Stream, StreamExt};

use crate::client::{StreamEvent, StreamEventKind};
use crate::trial::Trial;

/// Folds the events of one streamed exchange into a single record.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    deltas: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event in arrival order.
    ///
    /// Returns the terminal event once "done" arrives, `None` while the
    /// exchange is still in flight, and an error for an "error" event.
    pub fn push(&mut self, event: StreamEvent) -> Result<Option<StreamEvent>> {
        if let Some(delta) = event.delta.as_deref().filter(|d| !d.is_empty()) {
            self.content.push_str(delta);
            // Text riding on "done" arrived with the last byte, not the first token.
            if event.kind != Some(StreamEventKind::Done) {
                self.deltas += 1;
            }
        }

        match event.kind {
            Some(StreamEventKind::Error) => Err(BenchError::StreamError(
                event.error.unwrap_or_else(|| "unknown stream error".to_string()),
            )),
            Some(StreamEventKind::Done) => Ok(Some(event)),
            _ => Ok(None),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Build the record from the terminal event.
    pub fn finish(self, done: StreamEvent, trial: &Trial<'_>) -> Result<MeasurementRecord> {
        let timing = done
            .timing
            .ok_or_else(|| BenchError::Protocol("done event without timing".to_string()))?;

        let ttft_ms = match self.deltas {
            0 => None,
            _ => timing.ttft_ms,
        };
        let usage = done.usage.unwrap_or_default();

        let metrics = TrialMetrics {
            latency_ms: timing.latency_ms,
            ttft_ms,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            tokens_per_second: tokens_per_second(usage.completion_tokens, timing.latency_ms),
            response_length: self.content.chars().count(),
            response_content: Some(self.content),
            messages: Some(trial.prompt.messages.clone()),
        };

        Ok(MeasurementRecord::success(
            done.provider.unwrap_or_else(|| trial.provider.to_string()),
            done.model.unwrap_or_else(|| trial.nominal_model().to_string()),
            trial.prompt.name.clone(),
            trial.iteration,
            metrics,
        ))
    }
}

/// Drain `events` until the exchange completes.
///
/// Stops reading at the "done" event. Running out of events first is a
/// [`BenchError::StreamIncomplete`]; partial text is dropped on every failure.
pub async fn accumulate<S>(mut events: S, trial: &Trial<'_>) -> Result<MeasurementRecord>
where
    S: Stream<Item = Result<StreamEvent>> + Unpin,
{
    let mut acc = StreamAccumulator::new();

    while let Some(event) = events.next().await {
        if let Some(done) = acc.push(event?)? {
            return acc.finish(done, trial);
        }
    }

    Err(BenchError::StreamIncomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Usage;
    use chatbench_core::{ChatMessage, GenerationOptions, PromptDefinition};
    use futures::stream;

    fn prompt() -> PromptDefinition {
        PromptDefinition::new(
            "simple_greeting",
            vec![ChatMessage::user("Hello! How are you today?")],
            GenerationOptions::with_max_tokens(100),
        )
    }

    fn trial(prompt: &PromptDefinition) -> Trial<'_> {
        Trial {
            provider: "openai",
            prompt,
            iteration: 3,
        }
    }

    async fn run(events: Vec<Result<StreamEvent>>) -> Result<MeasurementRecord> {
        let prompt = prompt();
        accumulate(stream::iter(events), &trial(&prompt)).await
    }

    #[tokio::test]
    async fn test_deltas_then_done() {
        let record = run(vec![
            Ok(StreamEvent::delta("Hel")),
            Ok(StreamEvent::delta("lo!")),
            Ok(StreamEvent::done(2000.0, Some(150.0))
                .with_usage(Usage::new(12, 40))
                .with_origin("openai", "gpt-4o-2024-08-06")),
        ])
        .await
        .unwrap();

        assert!(record.is_success());
        assert_eq!(record.model, "gpt-4o-2024-08-06");
        assert_eq!(record.iteration, 3);
        assert_eq!(record.latency_ms(), Some(2000.0));
        assert_eq!(record.ttft_ms(), Some(150.0));
        assert_eq!(record.tokens_per_second(), Some(20.0));
        assert_eq!(record.response_length(), 6);
        let metrics = record.metrics().unwrap();
        assert_eq!(metrics.response_content.as_deref(), Some("Hello!"));
        assert_eq!(metrics.total_tokens, Some(52));
        assert_eq!(metrics.messages.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_without_done() {
        let err = run(vec![Ok(StreamEvent::delta("par")), Ok(StreamEvent::delta("tial"))])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::StreamIncomplete));
        assert_eq!(err.to_string(), "Stream ended without completion");
    }

    #[tokio::test]
    async fn test_error_event_aborts() {
        let err = run(vec![
            Ok(StreamEvent::delta("some text")),
            Ok(StreamEvent::error("rate limited")),
            Ok(StreamEvent::done(10.0, None)),
        ])
        .await
        .unwrap_err();
        match err {
            BenchError::StreamError(msg) => assert_eq!(msg, "rate limited"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let err = run(vec![
            Ok(StreamEvent::delta("a")),
            Err(BenchError::Http("connection reset".into())),
        ])
        .await
        .unwrap_err();
        assert!(matches!(err, BenchError::Http(_)));
    }

    #[tokio::test]
    async fn test_no_ttft_without_deltas() {
        let record = run(vec![Ok(StreamEvent::done(500.0, Some(80.0)))])
            .await
            .unwrap();
        assert_eq!(record.ttft_ms(), None);
        assert_eq!(record.response_length(), 0);
        assert_eq!(record.tokens_per_second(), None);
    }

    #[tokio::test]
    async fn test_done_falls_back_to_requested_identity() {
        let record = run(vec![Ok(StreamEvent::delta("x")), Ok(StreamEvent::done(100.0, None))])
            .await
            .unwrap();
        assert_eq!(record.provider, "openai");
        assert_eq!(record.model, "unknown");
    }

    #[tokio::test]
    async fn test_done_without_timing_is_protocol_error() {
        let mut done = StreamEvent::done(0.0, None);
        done.timing = None;
        let err = run(vec![Ok(StreamEvent::delta("x")), Ok(done)]).await.unwrap_err();
        assert!(matches!(err, BenchError::Protocol(_)));
    }

    #[test]
    fn test_delta_on_done_event_is_kept() {
        let mut acc = StreamAccumulator::new();
        let mut done = StreamEvent::done(100.0, Some(10.0));
        done.delta = Some("end".into());
        let terminal = acc.push(done).unwrap();
        assert!(terminal.is_some());
        assert_eq!(acc.content(), "end");
    }

    #[tokio::test]
    async fn test_text_only_on_done_has_no_ttft() {
        let mut done = StreamEvent::done(500.0, Some(10.0));
        done.delta = Some("end".into());
        let record = run(vec![Ok(done)]).await.unwrap();
        assert_eq!(record.ttft_ms(), None);
        assert_eq!(record.response_length(), 3);
    }
}
