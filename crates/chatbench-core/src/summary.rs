use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Mode;

/// Reduction over the records of one provider (+model+mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub provider: String,
    pub model: String,
    /// Total records reduced, failures included.
    pub iterations: u32,
    pub latency: LatencyStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttft: Option<TtftStats>,
    pub tokens: TokenStats,
    pub avg_response_length: f64,
    pub success_rate: f64,
}

/// Computed over successful records only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtftStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    pub avg_prompt: f64,
    pub avg_completion: f64,
    pub avg_total: f64,
    pub avg_tokens_per_second: f64,
}

impl AggregateSummary {
    pub fn all_failed(&self) -> bool {
        self.success_rate == 0.0
    }
}

/// Identifies one summary: `provider`, `provider:model`, or `provider:model:mode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl SummaryKey {
    pub fn provider(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            mode: None,
        }
    }

    pub fn model(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: Some(model.into()),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.provider)?;
        if let Some(model) = &self.model {
            write!(f, ":{}", model)?;
        }
        if let Some(mode) = self.mode {
            write!(f, ":{}", mode)?;
        }
        Ok(())
    }
}
