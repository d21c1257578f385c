use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatbench_benchmark::RunResults;
use chatbench_core::Mode;
use chrono::{DateTime, Local, Utc};
use tracing::debug;

use super::json::{JsonReport, ReportConfig};
use super::{ranked, KeyedSummary};

/// Results of one pass over the matrix in a single mode.
pub struct ModeRun {
    pub mode: Mode,
    pub results: RunResults,
}

/// Writes `<provider>/<model>_<mode>.json` per summary plus a `summary.md`
/// ranking every summary by mean latency.
pub struct ResultsWriter {
    root: PathBuf,
}

impl ResultsWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(
        &self,
        runs: &[ModeRun],
        iterations: u32,
        prompts: &[String],
        generated_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;

        let mut ranking: Vec<KeyedSummary> = Vec::new();

        for run in runs {
            let config = ReportConfig {
                iterations,
                streaming: run.mode.is_streaming(),
                prompts: prompts.to_vec(),
            };

            for group in &run.results.groups {
                let key = &group.key;
                let model = key.model.as_deref().unwrap_or(&group.summary.model);

                let keyed = [(key.clone().with_mode(run.mode), group.summary.clone())];
                let body = JsonReport::new(
                    &config,
                    &keyed,
                    Some(group.records.as_slice()),
                    generated_at,
                )
                .render()?;

                let dir = self.root.join(&key.provider);
                fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
                let path = dir.join(report_file_name(model, run.mode));
                fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
                debug!(path = %path.display(), "Wrote report");

                ranking.extend(keyed);
            }
        }

        let summary_path = self.root.join("summary.md");
        let summary = render_summary(&ranking, iterations, generated_at);
        fs::write(&summary_path, summary)
            .with_context(|| format!("writing {}", summary_path.display()))?;

        Ok(summary_path)
    }
}

/// `gpt-4o` in streaming mode becomes `gpt-4o_streaming.json`; `/` is not
/// allowed in the model part.
pub fn report_file_name(model: &str, mode: Mode) -> String {
    format!("{}_{}.json", model.replace('/', "_"), mode)
}

pub fn render_summary(summaries: &[KeyedSummary], iterations: u32, generated_at: DateTime<Utc>) -> String {
    let mut md = String::from("# Benchmark Summary & Model Rankings\n\n");
    md.push_str(&format!(
        "Date: {}\n",
        generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!("Iterations: {}\n\n", iterations));
    md.push_str("## Performance Ranking (Avg Latency)\n\n");
    md.push_str("| Rank | Model | Mode | Avg Latency | Avg TTFT | Response Length |\n");
    md.push_str("|------|-------|------|-------------|----------|-----------------|\n");

    for (rank, (key, s)) in ranked(summaries).into_iter().enumerate() {
        let ttft = s
            .ttft
            .as_ref()
            .map(|t| format!("{:.2}ms", t.mean))
            .unwrap_or_else(|| "N/A".to_string());
        let mode = key.mode.map(|m| m.to_string()).unwrap_or_default();
        md.push_str(&format!(
            "| {} | {}:{} | {} | {:.2}ms | {} | {:.0} chars |\n",
            rank + 1,
            key.provider,
            key.model.as_deref().unwrap_or(&s.model),
            mode,
            s.latency.mean,
            ttft,
            s.avg_response_length
        ));
    }
    md
}
