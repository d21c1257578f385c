use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use super::{percent, ranked, KeyedSummary};

pub fn render(summaries: &[KeyedSummary], generated_at: DateTime<Utc>) -> String {
    let sorted = ranked(summaries);
    let mut md = String::new();

    let _ = writeln!(md, "# LLM Provider Benchmark Report\n");
    let _ = writeln!(
        md,
        "**Generated:** {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    md.push_str("## Summary\n\n");
    md.push_str("| Provider | Model | Latency (avg) | Latency (p95) | TTFT | Tokens/s | Success |\n");
    md.push_str("|----------|-------|---------------|---------------|------|----------|---------|\n");

    for (key, s) in &sorted {
        let ttft = s
            .ttft
            .as_ref()
            .map(|t| format!("{:.0}ms", t.mean))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            md,
            "| {} | {} | {:.0}ms | {:.0}ms | {} | {:.1} | {} |",
            key,
            s.model,
            s.latency.mean,
            s.latency.p95,
            ttft,
            s.tokens.avg_tokens_per_second,
            percent(s.success_rate)
        );
    }

    md.push_str("\n## Detailed Results\n\n");

    for (key, s) in &sorted {
        let _ = writeln!(md, "### {} ({})\n", key, s.model);
        let _ = writeln!(md, "- **Iterations:** {}", s.iterations);
        let _ = writeln!(
            md,
            "- **Latency:** {:.0}ms avg, {:.0}-{:.0}ms range, ±{:.0}ms std",
            s.latency.mean, s.latency.min, s.latency.max, s.latency.std_dev
        );
        if let Some(ttft) = &s.ttft {
            let _ = writeln!(md, "- **Time to First Token:** {:.0}ms avg", ttft.mean);
        }
        let _ = writeln!(
            md,
            "- **Throughput:** {:.1} tokens/sec",
            s.tokens.avg_tokens_per_second
        );
        let _ = writeln!(
            md,
            "- **Avg Tokens:** {:.0} prompt, {:.0} completion\n",
            s.tokens.avg_prompt, s.tokens.avg_completion
        );
    }

    md
}
