use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BenchError, PromptDefinition, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5005".to_string(),
            organization_id: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Static,
    Streaming,
}

impl Mode {
    pub fn from_streaming(streaming: bool) -> Self {
        match streaming {
            true => Mode::Streaming,
            false => Mode::Static,
        }
    }

    pub fn is_streaming(self) -> bool {
        self == Mode::Streaming
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Static => "Static",
            Mode::Streaming => "Streaming",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Static => f.write_str("static"),
            Mode::Streaming => f.write_str("streaming"),
        }
    }
}

/// One orchestrated run. Not mutated once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Empty means every provider the backend reports.
    #[serde(default)]
    pub providers: Vec<String>,
    pub iterations: u32,
    pub streaming: bool,
    pub prompts: Vec<PromptDefinition>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            iterations: 1,
            streaming: false,
            prompts: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn mode(&self) -> Mode {
        Mode::from_streaming(self.streaming)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BenchError::Config("iterations must be greater than 0".into()));
        }
        if self.prompts.is_empty() {
            return Err(BenchError::Config("at least one prompt is required".into()));
        }
        Ok(())
    }
}
