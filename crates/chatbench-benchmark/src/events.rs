use chatbench_core::{AggregateSummary, MeasurementRecord, SummaryKey};
use serde::Serialize;
use tokio::sync::mpsc;

/// Lifecycle notifications emitted while a run traverses its matrix.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BenchmarkEvent {
    ProviderStarted {
        provider: String,
    },
    IterationCompleted {
        key: SummaryKey,
        record: MeasurementRecord,
    },
    TrialFailed {
        key: SummaryKey,
        prompt: String,
        iteration: u32,
        error: String,
    },
    ModelSkipped {
        provider: String,
        model: String,
        reason: String,
    },
    ProviderCompleted {
        key: SummaryKey,
        summary: AggregateSummary,
    },
}

/// Unbounded so emitting never waits on the consumer.
pub type EventSender = mpsc::UnboundedSender<BenchmarkEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<BenchmarkEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(tx: &EventSender, event: BenchmarkEvent) {
    // A dropped receiver just means nobody is listening.
    let _ = tx.send(event);
}
