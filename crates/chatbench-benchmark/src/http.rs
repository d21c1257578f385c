use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chatbench_core::{BackendConfig, BenchError, ChatMessage, GenerationOptions, Result};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{ChatBackend, ChatResponse, EventStream, ProviderInfo};
use crate::sse::SseDecoder;

const ORGANIZATION_HEADER: &str = "X-Dev-Organization-Id";

/// [`ChatBackend`] over the backend's dev LLM routes.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    organization_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    provider: &'a str,
    messages: &'a [ChatMessage],
    options: &'a GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    provider: Option<ProviderDescriptor>,
    #[serde(default)]
    config: Option<ProviderSettings>,
}

#[derive(Debug, Deserialize)]
struct ProviderDescriptor {
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderSettings {
    #[serde(default)]
    models: Option<Vec<String>>,
}

impl ProviderEntry {
    fn into_info(self) -> Option<ProviderInfo> {
        let descriptor = self.provider?;
        let models = self
            .config
            .and_then(|c| c.models)
            .unwrap_or(descriptor.models);

        Some(ProviderInfo {
            name: descriptor.name.unwrap_or_else(|| descriptor.key.clone()),
            kind: descriptor.kind.unwrap_or_default(),
            key: descriptor.key,
            models,
        })
    }
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BenchError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            organization_id: config.organization_id.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn with_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(reqwest::header::CONTENT_TYPE, "application/json");
        match &self.organization_id {
            Some(org) => req.header(ORGANIZATION_HEADER, org),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| BenchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BenchError::HttpStatus {
                status,
                body: format!("{} failed: {}", what, body),
            });
        }

        Ok(resp)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_providers(&self) -> Result<Vec<ProviderInfo>> {
        let req = self.get("/dev/api/organizations/current/providers?type=llm");
        let resp = self.send(req, "Get providers").await?;

        let body = resp
            .text()
            .await
            .map_err(|e| BenchError::Http(e.to_string()))?;
        let entries: Vec<ProviderEntry> = serde_json::from_str(&body)?;

        let providers: Vec<ProviderInfo> = entries
            .into_iter()
            .filter_map(ProviderEntry::into_info)
            .collect();

        info!(count = providers.len(), "Fetched providers");
        Ok(providers)
    }

    async fn chat(
        &self,
        provider: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            provider,
            messages,
            options,
        };
        let req = self.post("/dev/api/llm/chat").json(&request);
        let resp = self.send(req, "Chat").await?;

        let body = resp
            .text()
            .await
            .map_err(|e| BenchError::Http(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            BenchError::Protocol(format!(
                "Failed to parse response: {} - Body: {}",
                e,
                truncate(&body, 500)
            ))
        })
    }

    async fn stream(
        &self,
        provider: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<EventStream> {
        let request = ChatRequest {
            provider,
            messages,
            options,
        };
        let req = self.post("/dev/api/llm/stream").json(&request);
        let resp = self.send(req, "Stream").await?;
        debug!(provider, "Stream opened");

        let bytes = Box::pin(resp.bytes_stream()).fuse();
        let events = futures::stream::unfold(
            (bytes, SseDecoder::new(), VecDeque::new()),
            |(mut bytes, mut decoder, mut pending)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        return Some((Ok(event), (bytes, decoder, pending)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            let err = BenchError::Http(e.to_string());
                            return Some((Err(err), (bytes, decoder, pending)));
                        }
                        None => {
                            pending.extend(decoder.finish());
                            if pending.is_empty() {
                                return None;
                            }
                        }
                    }
                }
            },
        );

        Ok(Box::pin(events))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
