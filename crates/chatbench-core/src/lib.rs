// Domain modules
pub mod config;
pub mod error;
pub mod prompt;
pub mod record;
pub mod stats;
pub mod summary;

pub use config::{BackendConfig, Mode, RunConfig};
pub use error::{BenchError, Result};
pub use prompt::{ChatMessage, Effort, GenerationOptions, PromptDefinition, Role, ThinkingLevel};
pub use record::{tokens_per_second, MeasurementRecord, TrialMetrics, TrialOutcome};
pub use stats::summarize;
pub use summary::{AggregateSummary, LatencyStats, SummaryKey, TokenStats, TtftStats};
