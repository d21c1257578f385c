use chatbench_core::MeasurementRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::Serializer;
use serde::Serialize;

use super::KeyedSummary;

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub iterations: u32,
    pub streaming: bool,
    pub prompts: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub timestamp: String,
    pub config: &'a ReportConfig,
    #[serde(serialize_with = "keyed_map")]
    pub results: &'a [KeyedSummary],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<&'a [MeasurementRecord]>,
}

/// Serializes summaries as an object keyed by `SummaryKey`, in run order.
fn keyed_map<S: Serializer>(summaries: &&[KeyedSummary], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(summaries.iter().map(|(key, summary)| (key.to_string(), summary)))
}

impl<'a> JsonReport<'a> {
    pub fn new(
        config: &'a ReportConfig,
        results: &'a [KeyedSummary],
        raw_results: Option<&'a [MeasurementRecord]>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            config,
            results,
            raw_results,
        }
    }

    pub fn render(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
