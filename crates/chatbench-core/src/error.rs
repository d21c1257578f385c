use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Stream ended without completion")]
    StreamIncomplete,

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("No results to calculate stats")]
    NoResults,

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
