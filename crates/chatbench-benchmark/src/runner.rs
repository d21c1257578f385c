use chatbench_core::{
    summarize, AggregateSummary, MeasurementRecord, Mode, PromptDefinition, Result, RunConfig,
    SummaryKey,
};
use tracing::{info, instrument, warn};

use crate::availability::AvailabilityPolicy;
use crate::client::ChatBackend;
use crate::events::{emit, BenchmarkEvent, EventSender};
use crate::trial::{run_trial, Trial};

/// Drives the provider × (model) × prompt × iteration matrix, one trial at a time.
pub struct BenchmarkRunner<C> {
    client: C,
    availability: AvailabilityPolicy,
}

/// One summary together with the records it was reduced from.
///
/// Records keep the provider and model the backend echoed back, which may be
/// a resolved alias of the model in `key`.
#[derive(Debug, Clone)]
pub struct ResultGroup {
    pub key: SummaryKey,
    pub summary: AggregateSummary,
    pub records: Vec<MeasurementRecord>,
}

/// Result groups in traversal order.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub groups: Vec<ResultGroup>,
}

impl RunResults {
    pub fn group(&self, key: &SummaryKey) -> Option<&ResultGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }

    pub fn get(&self, key: &SummaryKey) -> Option<&AggregateSummary> {
        self.group(key).map(|g| &g.summary)
    }

    pub fn summaries(&self) -> Vec<(SummaryKey, AggregateSummary)> {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.summary.clone()))
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &MeasurementRecord> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    /// Tag every key with `mode`, for merging runs of both modes.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        for group in &mut self.groups {
            group.key.mode = Some(mode);
        }
        self
    }

    pub fn merge(&mut self, other: RunResults) {
        self.groups.extend(other.groups);
    }
}

/// How a model fared in a sweep.
enum ModelRun {
    Completed(Vec<MeasurementRecord>),
    Skipped,
}

impl<C: ChatBackend> BenchmarkRunner<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            availability: AvailabilityPolicy::default(),
        }
    }

    pub fn with_availability(mut self, availability: AvailabilityPolicy) -> Self {
        self.availability = availability;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Benchmark each configured provider with its default model.
    ///
    /// With no providers configured, every provider the backend reports is
    /// used. A failing trial becomes a failed record and never stops the run.
    #[instrument(skip_all, fields(iterations = config.iterations, mode = %config.mode()))]
    pub async fn run(&self, config: &RunConfig, tx: &EventSender) -> Result<RunResults> {
        config.validate()?;

        let providers: Vec<String> = match config.providers.is_empty() {
            true => self
                .client
                .list_providers()
                .await?
                .into_iter()
                .map(|p| p.key)
                .collect(),
            false => config.providers.clone(),
        };
        info!("Benchmarking {} providers", providers.len());

        let mode = config.mode();
        let mut results = RunResults::default();

        for provider in &providers {
            info!(provider = %provider, "Starting provider");
            emit(tx, BenchmarkEvent::ProviderStarted {
                provider: provider.clone(),
            });

            let key = SummaryKey::provider(provider);
            let mut records = Vec::new();

            for prompt in &config.prompts {
                for iteration in 1..=config.iterations {
                    let trial = Trial {
                        provider,
                        prompt,
                        iteration,
                    };
                    let record = match run_trial(&self.client, &trial, mode).await {
                        Ok(record) => {
                            emit(tx, BenchmarkEvent::IterationCompleted {
                                key: key.clone(),
                                record: record.clone(),
                            });
                            record
                        }
                        Err(e) => {
                            warn!(provider = %provider, prompt = %prompt.name, iteration, "Trial failed: {}", e);
                            emit(tx, BenchmarkEvent::TrialFailed {
                                key: key.clone(),
                                prompt: prompt.name.clone(),
                                iteration,
                                error: e.to_string(),
                            });
                            trial.failure(&e)
                        }
                    };
                    records.push(record);
                }
            }

            Self::complete(key, records, &mut results, tx)?;
        }

        Ok(results)
    }

    /// Benchmark every model each provider advertises.
    ///
    /// The configured provider list, when non-empty, filters the backend's
    /// providers. A model whose first unavailable-looking error arrives is
    /// abandoned: its remaining trials are not issued and it gets no summary.
    #[instrument(skip_all, fields(iterations = config.iterations, mode = %config.mode()))]
    pub async fn run_across_models(&self, config: &RunConfig, tx: &EventSender) -> Result<RunResults> {
        config.validate()?;

        let providers: Vec<_> = self
            .client
            .list_providers()
            .await?
            .into_iter()
            .filter(|p| config.providers.is_empty() || config.providers.contains(&p.key))
            .collect();
        info!("Sweeping {} providers", providers.len());

        let mut results = RunResults::default();

        for info in &providers {
            info!(provider = %info.key, models = info.models.len(), "Starting provider");
            emit(tx, BenchmarkEvent::ProviderStarted {
                provider: info.key.clone(),
            });

            for model in &info.models {
                match self.run_model(&info.key, model, config, tx).await {
                    ModelRun::Completed(records) => {
                        let key = SummaryKey::model(&info.key, model);
                        Self::complete(key, records, &mut results, tx)?;
                    }
                    ModelRun::Skipped => {}
                }
            }
        }

        Ok(results)
    }

    async fn run_model(
        &self,
        provider: &str,
        model: &str,
        config: &RunConfig,
        tx: &EventSender,
    ) -> ModelRun {
        let key = SummaryKey::model(provider, model);
        let prompts: Vec<PromptDefinition> = config.prompts.iter().map(|p| p.with_model(model)).collect();
        let mode = config.mode();
        let mut records = Vec::new();

        for iteration in 1..=config.iterations {
            for prompt in &prompts {
                let trial = Trial {
                    provider,
                    prompt,
                    iteration,
                };
                match run_trial(&self.client, &trial, mode).await {
                    Ok(record) => {
                        emit(tx, BenchmarkEvent::IterationCompleted {
                            key: key.clone(),
                            record: record.clone(),
                        });
                        records.push(record);
                    }
                    Err(e) if self.availability.is_model_unavailable(&e) => {
                        warn!(provider, model, "Skipping unavailable model: {}", e);
                        emit(tx, BenchmarkEvent::ModelSkipped {
                            provider: provider.to_string(),
                            model: model.to_string(),
                            reason: e.to_string(),
                        });
                        return ModelRun::Skipped;
                    }
                    Err(e) => {
                        warn!(provider, model, prompt = %prompt.name, iteration, "Trial failed: {}", e);
                        emit(tx, BenchmarkEvent::TrialFailed {
                            key: key.clone(),
                            prompt: prompt.name.clone(),
                            iteration,
                            error: e.to_string(),
                        });
                        records.push(trial.failure(&e));
                    }
                }
            }
        }

        ModelRun::Completed(records)
    }

    fn complete(
        key: SummaryKey,
        records: Vec<MeasurementRecord>,
        results: &mut RunResults,
        tx: &EventSender,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let summary = summarize(&records)?;
        info!(
            key = %key,
            mean_ms = summary.latency.mean,
            success_rate = summary.success_rate,
            "Provider complete"
        );
        emit(tx, BenchmarkEvent::ProviderCompleted {
            key: key.clone(),
            summary: summary.clone(),
        });

        results.groups.push(ResultGroup {
            key,
            summary,
            records,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StreamEvent;
    use crate::events::{event_channel, EventReceiver};
    use crate::testing::{Behavior, FakeBackend};
    use chatbench_core::{BenchError, ChatMessage, GenerationOptions};

    fn prompts() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition::new(
                "simple_greeting",
                vec![ChatMessage::user("Hello! How are you today?")],
                GenerationOptions::with_max_tokens(100),
            ),
            PromptDefinition::new(
                "simple_factual",
                vec![ChatMessage::user("What is the capital of France?")],
                GenerationOptions::with_max_tokens(50),
            ),
        ]
    }

    fn config(providers: &[&str], iterations: u32, streaming: bool) -> RunConfig {
        RunConfig {
            providers: providers.iter().map(|p| p.to_string()).collect(),
            iterations,
            streaming,
            prompts: prompts(),
        }
    }

    fn drain(rx: &mut EventReceiver) -> Vec<BenchmarkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_fixed_mode_isolates_failures() {
        let backend = FakeBackend::new()
            .provider("openai", &[], Behavior::Ok { latency_ms: 100.0 })
            .provider("broken", &[], Behavior::Fail("connection refused".into()));
        let runner = BenchmarkRunner::new(backend);
        let (tx, mut rx) = event_channel();

        let results = runner
            .run(&config(&["openai", "broken"], 3, false), &tx)
            .await
            .unwrap();

        assert_eq!(results.groups.len(), 2);
        let ok = results.get(&SummaryKey::provider("openai")).unwrap();
        assert_eq!(ok.iterations, 6);
        assert_eq!(ok.success_rate, 1.0);
        assert_eq!(ok.latency.mean, 100.0);

        let broken = results.get(&SummaryKey::provider("broken")).unwrap();
        assert_eq!(broken.iterations, 6);
        assert_eq!(broken.success_rate, 0.0);
        assert_eq!(results.records().count(), 12);
        assert_eq!(runner.client().calls(), 12);

        let events = drain(&mut rx);
        let failures = events
            .iter()
            .filter(|e| matches!(e, BenchmarkEvent::TrialFailed { .. }))
            .count();
        assert_eq!(failures, 6);
        assert!(matches!(events[0], BenchmarkEvent::ProviderStarted { ref provider } if provider == "openai"));
        assert!(matches!(events.last(), Some(BenchmarkEvent::ProviderCompleted { .. })));
    }

    #[tokio::test]
    async fn test_fixed_mode_trial_order() {
        let backend = FakeBackend::new().provider("openai", &[], Behavior::Ok { latency_ms: 1.0 });
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner.run(&config(&["openai"], 2, false), &tx).await.unwrap();
        let order: Vec<(String, u32)> = results
            .records()
            .map(|r| (r.prompt.clone(), r.iteration))
            .collect();
        assert_eq!(
            order,
            vec![
                ("simple_greeting".to_string(), 1),
                ("simple_greeting".to_string(), 2),
                ("simple_factual".to_string(), 1),
                ("simple_factual".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_discovers_providers_when_none_configured() {
        let backend = FakeBackend::new()
            .provider("openai", &[], Behavior::Ok { latency_ms: 10.0 })
            .provider("mistral", &[], Behavior::Ok { latency_ms: 20.0 });
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner.run(&config(&[], 1, false), &tx).await.unwrap();
        let keys: Vec<String> = results.groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["openai", "mistral"]);
    }

    #[tokio::test]
    async fn test_streaming_mode_records_ttft() {
        let backend = FakeBackend::new().provider(
            "openai",
            &[],
            Behavior::Stream(vec![
                StreamEvent::delta("Bonjour"),
                StreamEvent::done(400.0, Some(90.0)),
            ]),
        );
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner.run(&config(&["openai"], 2, true), &tx).await.unwrap();
        let summary = results.get(&SummaryKey::provider("openai")).unwrap();
        let ttft = summary.ttft.as_ref().unwrap();
        assert_eq!(ttft.mean, 90.0);
        assert_eq!(summary.avg_response_length, 7.0);
    }

    #[tokio::test]
    async fn test_incomplete_stream_is_failed_record() {
        let backend = FakeBackend::new().provider(
            "openai",
            &[],
            Behavior::Stream(vec![StreamEvent::delta("a"), StreamEvent::delta("b")]),
        );
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner.run(&config(&["openai"], 1, true), &tx).await.unwrap();
        assert_eq!(results.records().count(), 2);
        for record in results.records() {
            assert_eq!(record.error(), Some("Stream ended without completion"));
            assert_eq!(record.response_length(), 0);
        }
    }

    #[tokio::test]
    async fn test_sweep_skips_unavailable_model() {
        let backend = FakeBackend::new()
            .provider("openai", &["gpt-4o", "gpt-9"], Behavior::Ok { latency_ms: 50.0 })
            .model("gpt-9", Behavior::Fail("model_not_found: gpt-9".into()));
        let runner = BenchmarkRunner::new(backend);
        let (tx, mut rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 5, false), &tx)
            .await
            .unwrap();

        assert_eq!(results.groups.len(), 1);
        assert!(results.get(&SummaryKey::model("openai", "gpt-4o")).is_some());
        assert!(results.get(&SummaryKey::model("openai", "gpt-9")).is_none());
        assert!(results.records().all(|r| r.model != "gpt-9"));
        // 5 iterations x 2 prompts for gpt-4o, one probe for gpt-9
        assert_eq!(runner.client().calls(), 11);

        let skipped: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                BenchmarkEvent::ModelSkipped { model, reason, .. } => Some((model, reason)),
                _ => None,
            })
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, "gpt-9");
        assert!(skipped[0].1.contains("model_not_found"));
    }

    #[tokio::test]
    async fn test_sweep_records_other_errors() {
        let backend = FakeBackend::new()
            .provider("anthropic", &["claude-sonnet"], Behavior::Ok { latency_ms: 50.0 })
            .model("claude-sonnet", Behavior::Fail("overloaded".into()));
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 2, false), &tx)
            .await
            .unwrap();

        let summary = results
            .get(&SummaryKey::model("anthropic", "claude-sonnet"))
            .unwrap();
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(runner.client().calls(), 4);
        assert!(results.records().all(|r| r.model == "claude-sonnet"));
    }

    #[tokio::test]
    async fn test_sweep_filters_providers_and_forces_model() {
        let backend = FakeBackend::new()
            .provider("openai", &["gpt-4o-mini"], Behavior::Ok { latency_ms: 10.0 })
            .provider("mistral", &["mistral-small"], Behavior::Ok { latency_ms: 10.0 });
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner
            .run_across_models(&config(&["mistral"], 1, false), &tx)
            .await
            .unwrap();

        assert_eq!(results.groups.len(), 1);
        assert_eq!(results.groups[0].key.to_string(), "mistral:mistral-small");
        assert!(results.records().all(|r| r.model == "mistral-small"));
    }

    #[tokio::test]
    async fn test_sweep_trial_order_is_iteration_major() {
        let backend = FakeBackend::new().provider("openai", &["gpt-4o"], Behavior::Ok { latency_ms: 1.0 });
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 2, false), &tx)
            .await
            .unwrap();
        let order: Vec<(u32, &str)> = results
            .records()
            .map(|r| (r.iteration, r.prompt.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "simple_greeting"),
                (1, "simple_factual"),
                (2, "simple_greeting"),
                (2, "simple_factual"),
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_discovery_failure_aborts() {
        let backend = FakeBackend::new().failing_discovery();
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let err = runner.run(&config(&[], 1, false), &tx).await.unwrap_err();
        assert!(matches!(err, BenchError::Http(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_call() {
        let runner = BenchmarkRunner::new(FakeBackend::new());
        let (tx, _rx) = event_channel();
        let mut cfg = config(&["openai"], 0, false);

        assert!(matches!(
            runner.run(&cfg, &tx).await,
            Err(BenchError::Config(_))
        ));
        cfg.iterations = 1;
        cfg.prompts.clear();
        assert!(runner.run_across_models(&cfg, &tx).await.is_err());
        assert_eq!(runner.client().calls(), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stop_run() {
        let backend = FakeBackend::new().provider("openai", &[], Behavior::Ok { latency_ms: 5.0 });
        let runner = BenchmarkRunner::new(backend);
        let (tx, rx) = event_channel();
        drop(rx);

        let results = runner.run(&config(&["openai"], 1, false), &tx).await.unwrap();
        assert_eq!(results.records().count(), 2);
    }

    #[tokio::test]
    async fn test_sweep_groups_records_under_requested_model() {
        let backend = FakeBackend::new()
            .provider("openai", &["gpt-4o", "gpt-4o-latest"], Behavior::Ok { latency_ms: 20.0 })
            .alias("gpt-4o", "gpt-4o-2024-08-06")
            .alias("gpt-4o-latest", "gpt-4o-2024-08-06");
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 2, false), &tx)
            .await
            .unwrap();

        assert_eq!(results.groups.len(), 2);
        for model in ["gpt-4o", "gpt-4o-latest"] {
            let group = results.group(&SummaryKey::model("openai", model)).unwrap();
            assert_eq!(group.records.len(), 4);
            assert_eq!(group.summary.iterations, 4);
            assert!(group.records.iter().all(|r| r.model == "gpt-4o-2024-08-06"));
        }
        assert_eq!(results.records().count(), 8);
    }

    #[tokio::test]
    async fn test_custom_availability_policy() {
        let backend = FakeBackend::new()
            .provider("openai", &["gpt-4o"], Behavior::Ok { latency_ms: 20.0 })
            .model("gpt-4o", Behavior::Fail("proxy returned 404 page".into()));
        let policy = AvailabilityPolicy::new("(?i)model_not_found").unwrap();
        let runner = BenchmarkRunner::new(backend).with_availability(policy);
        let (tx, mut rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 2, false), &tx)
            .await
            .unwrap();

        let summary = results.get(&SummaryKey::model("openai", "gpt-4o")).unwrap();
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(runner.client().calls(), 4);
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, BenchmarkEvent::ModelSkipped { .. })));
    }

    #[tokio::test]
    async fn test_default_policy_skips_on_404_text() {
        let backend = FakeBackend::new()
            .provider("openai", &["gpt-4o"], Behavior::Ok { latency_ms: 20.0 })
            .model("gpt-4o", Behavior::Fail("proxy returned 404 page".into()));
        let runner = BenchmarkRunner::new(backend);
        let (tx, _rx) = event_channel();

        let results = runner
            .run_across_models(&config(&[], 2, false), &tx)
            .await
            .unwrap();
        assert!(results.groups.is_empty());
        assert_eq!(runner.client().calls(), 1);
    }

    #[test]
    fn test_results_with_mode_and_merge() {
        let record = MeasurementRecord::failure("p", "m", "x", 1, "e");
        let group = ResultGroup {
            key: SummaryKey::model("p", "m"),
            summary: summarize(std::slice::from_ref(&record)).unwrap(),
            records: vec![record],
        };
        let mut static_run = RunResults {
            groups: vec![group.clone()],
        }
        .with_mode(Mode::Static);
        let streaming_run = RunResults {
            groups: vec![group],
        }
        .with_mode(Mode::Streaming);

        static_run.merge(streaming_run);
        let keys: Vec<String> = static_run.summaries().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["p:m:static", "p:m:streaming"]);
        assert_eq!(static_run.records().count(), 2);
    }
}
