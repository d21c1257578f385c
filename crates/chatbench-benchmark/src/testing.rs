//! In-memory [`ChatBackend`] for exercising the runner without a server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chatbench_core::{BenchError, ChatMessage, GenerationOptions, Result};
use futures::stream;

use crate::client::{
    ChatBackend, ChatResponse, EventStream, ProviderInfo, ResponseTiming, StreamEvent, Usage,
};

#[derive(Debug, Clone)]
pub enum Behavior {
    Ok { latency_ms: f64 },
    Fail(String),
    Stream(Vec<StreamEvent>),
}

#[derive(Default)]
pub struct FakeBackend {
    providers: Vec<(ProviderInfo, Behavior)>,
    models: HashMap<String, Behavior>,
    aliases: HashMap<String, String>,
    discovery_fails: bool,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, key: &str, models: &[&str], behavior: Behavior) -> Self {
        let info = ProviderInfo {
            key: key.to_string(),
            name: key.to_string(),
            kind: key.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
        };
        self.providers.push((info, behavior));
        self
    }

    /// Override the behavior for one model, across providers.
    pub fn model(mut self, model: &str, behavior: Behavior) -> Self {
        self.models.insert(model.to_string(), behavior);
        self
    }

    /// Report `resolved` as the model that served requests for `requested`.
    pub fn alias(mut self, requested: &str, resolved: &str) -> Self {
        self.aliases.insert(requested.to_string(), resolved.to_string());
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.discovery_fails = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn behavior(&self, provider: &str, options: &GenerationOptions) -> Behavior {
        if let Some(b) = options.model.as_ref().and_then(|m| self.models.get(m)) {
            return b.clone();
        }
        self.providers
            .iter()
            .find(|(info, _)| info.key == provider)
            .map(|(_, b)| b.clone())
            .unwrap_or_else(|| Behavior::Fail(format!("provider {provider} is not enabled")))
    }

    fn resolved_model(&self, provider: &str, options: &GenerationOptions) -> String {
        match &options.model {
            Some(model) => self.aliases.get(model).unwrap_or(model).clone(),
            None => format!("{provider}-default"),
        }
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn list_providers(&self) -> Result<Vec<ProviderInfo>> {
        match self.discovery_fails {
            true => Err(BenchError::Http("connection refused".into())),
            false => Ok(self.providers.iter().map(|(info, _)| info.clone()).collect()),
        }
    }

    async fn chat(
        &self,
        provider: &str,
        _messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior(provider, options) {
            Behavior::Ok { latency_ms } => Ok(ChatResponse {
                content: "Paris".into(),
                usage: Some(Usage::new(10, 20)),
                finish_reason: Some("stop".into()),
                timing: ResponseTiming { latency_ms },
                provider: provider.to_string(),
                model: self.resolved_model(provider, options),
            }),
            Behavior::Fail(msg) => Err(BenchError::Http(msg)),
            Behavior::Stream(_) => Err(BenchError::Protocol("streaming only".into())),
        }
    }

    async fn stream(
        &self,
        provider: &str,
        _messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<EventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior(provider, options) {
            Behavior::Stream(events) => {
                let events: Vec<Result<StreamEvent>> = events.into_iter().map(Ok).collect();
                Ok(Box::pin(stream::iter(events)))
            }
            Behavior::Ok { latency_ms } => {
                let done = StreamEvent::done(latency_ms, Some(latency_ms / 4.0))
                    .with_usage(Usage::new(10, 20))
                    .with_origin(provider, &self.resolved_model(provider, options));
                let events: Vec<Result<StreamEvent>> = vec![Ok(StreamEvent::delta("Paris")), Ok(done)];
                Ok(Box::pin(stream::iter(events)))
            }
            Behavior::Fail(msg) => Err(BenchError::Http(msg)),
        }
    }
}
