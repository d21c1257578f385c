use chatbench_core::{BenchError, Result};
use regex::Regex;

/// Error text that marks a model as missing or inaccessible.
pub const DEFAULT_UNAVAILABLE_PATTERN: &str =
    r"(?i)does not exist|not found|no access|not available|model_not_found|404";

/// Decides when a sweep should stop calling a model.
///
/// This is a heuristic over free-text errors: a transient failure whose text
/// happens to match (say, a proxy page mentioning 404) skips the model too.
/// Pass a narrower pattern via [`AvailabilityPolicy::new`] to tighten it.
#[derive(Debug, Clone)]
pub struct AvailabilityPolicy {
    pattern: Regex,
}

impl AvailabilityPolicy {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BenchError::Config(format!("invalid availability pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn is_model_unavailable(&self, error: &BenchError) -> bool {
        if let BenchError::HttpStatus { status: 404, .. } = error {
            return true;
        }
        self.pattern.is_match(&error.to_string())
    }
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_UNAVAILABLE_PATTERN).expect("invalid default availability regex"),
        }
    }
}
