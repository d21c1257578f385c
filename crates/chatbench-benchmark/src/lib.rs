pub mod accumulator;
pub mod availability;
pub mod client;
pub mod events;
pub mod http;
pub mod prompts;
pub mod runner;
pub mod sse;
pub mod trial;

#[cfg(test)]
mod testing;

pub use accumulator::{accumulate, StreamAccumulator};
pub use availability::{AvailabilityPolicy, DEFAULT_UNAVAILABLE_PATTERN};
pub use client::{
    ChatBackend, ChatResponse, EventStream, ProviderInfo, ResponseTiming, StreamEvent,
    StreamEventKind, StreamTiming, Usage,
};
pub use events::{event_channel, BenchmarkEvent, EventReceiver, EventSender};
pub use http::HttpBackend;
pub use prompts::PromptSet;
pub use runner::{BenchmarkRunner, ResultGroup, RunResults};
pub use sse::SseDecoder;
pub use trial::{record_from_response, run_trial, Trial};
