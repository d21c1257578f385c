mod report;

use std::path::PathBuf;

use anyhow::Result;
use chatbench_benchmark::{
    event_channel, BenchmarkEvent, BenchmarkRunner, EventReceiver, HttpBackend, PromptSet,
    RunResults,
};
use chatbench_core::{BackendConfig, Mode, RunConfig};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use report::json::{JsonReport, ReportConfig};
use report::results_dir::{ModeRun, ResultsWriter};
use report::{console, markdown};

#[derive(Parser)]
#[command(name = "chatbench")]
#[command(about = "chatbench - LLM Provider Benchmark Suite", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend base URL
    #[arg(short, long, env = "AICO_BACKEND_URL", default_value = "http://localhost:5005")]
    url: String,

    /// Organization ID sent with every request
    #[arg(short, long, env = "AICO_ORGANIZATION_ID")]
    org: Option<String>,

    /// Test this provider only
    #[arg(short, long)]
    provider: Option<String>,

    /// Sweep every model of every provider, in both static and streaming mode
    #[arg(short, long)]
    all_models: bool,

    /// Prompt set (simple, reasoning, coding, reit, all)
    #[arg(short = 't', long, default_value = "all")]
    prompts: PromptSet,

    /// Iterations per prompt
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    iterations: u32,

    /// Use streaming inference
    #[arg(short, long)]
    streaming: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "console")]
    format: OutputFormat,

    /// Show per-iteration results (and raw records in JSON output)
    #[arg(short, long)]
    verbose: bool,

    /// Directory for per-model reports and summary.md
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "300")]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Console,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let backend = HttpBackend::new(&BackendConfig {
        url: cli.url.clone(),
        organization_id: cli.org.clone(),
        timeout_secs: cli.timeout,
    })?;
    let runner = BenchmarkRunner::new(backend);

    let prompts = cli.prompts.prompts();
    let prompt_names: Vec<String> = prompts.iter().map(|p| p.name.clone()).collect();
    let is_console = cli.format == OutputFormat::Console;

    if is_console {
        println!("{}", console::header());
        println!("Backend: {}", runner.client().base_url());
        println!("Prompts: {} ({} prompts)", cli.prompts, prompts.len());
        println!("Iterations: {}", cli.iterations);
    }

    let modes = match cli.all_models {
        true => vec![Mode::Static, Mode::Streaming],
        false => vec![Mode::from_streaming(cli.streaming)],
    };

    let mut runs = Vec::with_capacity(modes.len());

    for mode in modes {
        if is_console {
            println!("\n▶ Starting {} Evaluation...", mode.label());
        }

        let config = RunConfig {
            providers: cli.provider.iter().cloned().collect(),
            iterations: cli.iterations,
            streaming: mode.is_streaming(),
            prompts: prompts.clone(),
        };

        let (tx, rx) = event_channel();
        let printer = tokio::spawn(print_events(rx, mode, is_console, cli.verbose));

        let results = match cli.all_models {
            true => runner.run_across_models(&config, &tx).await,
            false => runner.run(&config, &tx).await,
        };
        drop(tx);
        printer.await?;

        let results = results?;
        info!(%mode, summaries = results.groups.len(), records = results.records().count(), "Run complete");
        runs.push(ModeRun { mode, results });
    }

    let generated_at = Utc::now();
    let writer = ResultsWriter::new(&cli.output_dir);
    let summary_path = writer.write(&runs, cli.iterations, &prompt_names, generated_at)?;
    info!(path = %summary_path.display(), "Wrote summary");
    if is_console {
        println!("\n✅ Results saved to {}", writer.root().display());
    }

    let mut combined = RunResults::default();
    for run in runs {
        combined.merge(run.results.with_mode(run.mode));
    }

    let summaries = combined.summaries();

    match cli.format {
        OutputFormat::Console => println!("{}", console::summary_table(&summaries)),
        OutputFormat::Json => {
            let config = ReportConfig {
                iterations: cli.iterations,
                streaming: cli.streaming,
                prompts: prompt_names,
            };
            let records: Vec<_> = combined.records().cloned().collect();
            let raw = cli.verbose.then_some(records.as_slice());
            let report = JsonReport::new(&config, &summaries, raw, generated_at);
            println!("{}", report.render()?);
        }
        OutputFormat::Markdown => println!("{}", markdown::render(&summaries, generated_at)),
    }

    Ok(())
}

/// Console progress for one mode. Drains the channel even when silent so the
/// runner's sends never pile up.
async fn print_events(mut rx: EventReceiver, mode: Mode, is_console: bool, verbose: bool) {
    while let Some(event) = rx.recv().await {
        if !is_console {
            continue;
        }
        match event {
            BenchmarkEvent::ProviderStarted { provider } => {
                println!("{}", console::provider_start(&provider, mode))
            }
            BenchmarkEvent::IterationCompleted { record, .. } if verbose => {
                println!("{}", console::iteration_line(&record))
            }
            BenchmarkEvent::IterationCompleted { .. } => {}
            BenchmarkEvent::TrialFailed { key, error, .. } => {
                eprintln!("{}", console::trial_failed(&key.to_string(), &error))
            }
            BenchmarkEvent::ModelSkipped {
                provider, model, ..
            } => println!("{}", console::model_skipped(&provider, &model)),
            BenchmarkEvent::ProviderCompleted { summary, .. } => {
                println!("{}", console::provider_stats(&summary))
            }
        }
    }
}
