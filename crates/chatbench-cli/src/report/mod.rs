pub mod console;
pub mod json;
pub mod markdown;
pub mod results_dir;

use chatbench_core::{AggregateSummary, SummaryKey};

pub type KeyedSummary = (SummaryKey, AggregateSummary);

/// Summaries ordered by ascending mean latency. Ties keep run order.
pub fn ranked(summaries: &[KeyedSummary]) -> Vec<&KeyedSummary> {
    let mut sorted: Vec<&KeyedSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.1.latency.mean.total_cmp(&b.1.latency.mean));
    sorted
}

pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}
