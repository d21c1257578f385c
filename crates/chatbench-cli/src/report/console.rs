use chatbench_core::{AggregateSummary, MeasurementRecord, Mode};

use super::{percent, ranked, KeyedSummary};

pub fn header() -> String {
    format!("\nchatbench - LLM Provider Benchmark\n\n{:=<60}", "")
}

pub fn provider_start(provider: &str, mode: Mode) -> String {
    format!("\n📊 Testing {} ({})...", provider, mode.label())
}

pub fn iteration_line(record: &MeasurementRecord) -> String {
    let Some(metrics) = record.metrics() else {
        return format!(
            "  ✗ [{}] {}",
            record.iteration,
            record.error().unwrap_or_default()
        );
    };

    let mut line = format!("  ✓ [{}] {:.0}ms", record.iteration, metrics.latency_ms);
    if let Some(ttft) = metrics.ttft_ms {
        line.push_str(&format!(" TTFT: {:.0}ms", ttft));
    }
    if let Some(tps) = metrics.tokens_per_second {
        line.push_str(&format!(" ({:.1} tok/s)", tps));
    }
    line
}

pub fn trial_failed(key: &str, error: &str) -> String {
    format!("  ✗ Error [{}]: {}", key, error)
}

pub fn model_skipped(provider: &str, model: &str) -> String {
    format!("  ⊘ Skipped [{}:{}] (not available)", provider, model)
}

pub fn provider_stats(summary: &AggregateSummary) -> String {
    let mut out = format!("\n  📈 {} ({})\n", summary.provider, summary.model);

    if summary.all_failed() {
        out.push_str("     ⚠️  All iterations failed\n");
        out.push_str(&format!("     Success: {}", percent(summary.success_rate)));
        return out;
    }

    out.push_str(&format!(
        "     Latency: {:.0}ms avg (p95: {:.0}ms)\n",
        summary.latency.mean, summary.latency.p95
    ));
    if let Some(ttft) = &summary.ttft {
        out.push_str(&format!("     TTFT: {:.0}ms avg\n", ttft.mean));
    }
    out.push_str(&format!(
        "     Tokens/s: {:.1}\n",
        summary.tokens.avg_tokens_per_second
    ));
    out.push_str(&format!("     Success: {}", percent(summary.success_rate)));
    out
}

pub fn summary_table(summaries: &[KeyedSummary]) -> String {
    let keys: Vec<String> = summaries.iter().map(|(k, _)| k.to_string()).collect();
    let width = keys.iter().map(String::len).max().unwrap_or(0).max(13) + 2;

    let mut out = format!("\n{:=<60}\n\n📊 SUMMARY\n\n", "");
    out.push_str(&format!(
        "{:<width$}{:<12}{:<10}{:<12}{}\n",
        "Provider", "Latency", "TTFT", "Tok/s", "Success"
    ));
    out.push_str(&format!("{:-<1$}\n", "", width + 44));

    for (key, summary) in ranked(summaries) {
        let ttft = summary
            .ttft
            .as_ref()
            .map(|t| format!("{:.0}ms", t.mean))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<width$}{:<12}{:<10}{:<12}{}\n",
            key.to_string(),
            format!("{:.0}ms", summary.latency.mean),
            ttft,
            format!("{:.1}", summary.tokens.avg_tokens_per_second),
            percent(summary.success_rate)
        ));
    }
    out
}
