use std::pin::Pin;

use async_trait::async_trait;
use chatbench_core::{ChatMessage, GenerationOptions, Result};
use futures::Stream;
use serde::{Deserialize, Serialize};

/// Single-pass sequence of events from one streamed exchange.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// The normalized chat API the benchmark runs against.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Enabled providers, each with the models it advertises.
    async fn list_providers(&self) -> Result<Vec<ProviderInfo>>;

    async fn chat(
        &self,
        provider: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatResponse>;

    async fn stream(
        &self,
        provider: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<EventStream>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub key: String,
    pub name: String,
    pub kind: String,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            total_tokens: Some(prompt_tokens + completion_tokens),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTiming {
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub timing: ResponseTiming,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEventKind {
    Done,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTiming {
    pub latency_ms: f64,
    #[serde(default)]
    pub ttft_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    #[serde(default)]
    pub delta: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<StreamEventKind>,
    #[serde(default)]
    pub timing: Option<StreamTiming>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StreamEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn done(latency_ms: f64, ttft_ms: Option<f64>) -> Self {
        Self {
            kind: Some(StreamEventKind::Done),
            timing: Some(StreamTiming {
                latency_ms,
                ttft_ms,
            }),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: Some(StreamEventKind::Error),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_origin(mut self, provider: &str, model: &str) -> Self {
        self.provider = Some(provider.to_string());
        self.model = Some(model.to_string());
        self
    }
}
