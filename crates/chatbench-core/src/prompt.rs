use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Reasoning effort hint, forwarded to providers that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// Reasoning depth hint for providers with a thinking budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThinkingLevel {
    Low,
    Medium,
    High,
}

/// Generation options sent with every request for a prompt.
///
/// Every field is optional. `None` is never serialized, so the backend's own
/// default applies:
///
/// * `model` - provider's default model
/// * `temperature` - backend default sampling temperature
/// * `max_tokens` - backend default completion limit
/// * `effort` / `thinking_level` - not sent, provider decides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<Effort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_level: Option<ThinkingLevel>,
}

impl GenerationOptions {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }

    pub fn reasoning(mut self, effort: Effort, thinking_level: ThinkingLevel) -> Self {
        self.effort = Some(effort);
        self.thinking_level = Some(thinking_level);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl PromptDefinition {
    pub fn new(name: impl Into<String>, messages: Vec<ChatMessage>, options: GenerationOptions) -> Self {
        Self {
            name: name.into(),
            messages,
            options,
        }
    }

    /// Copy of this prompt with the model override forced to `model`.
    pub fn with_model(&self, model: &str) -> Self {
        let mut prompt = self.clone();
        prompt.options.model = Some(model.to_string());
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_skip_unset_fields() {
        let opts = GenerationOptions::with_max_tokens(100);
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json, serde_json::json!({ "maxTokens": 100 }));
    }

    #[test]
    fn test_reasoning_options_wire_names() {
        let opts = GenerationOptions::with_max_tokens(4000).reasoning(Effort::High, ThinkingLevel::High);
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["effort"], "high");
        assert_eq!(json["thinkingLevel"], "HIGH");
    }

    #[test]
    fn test_with_model_overrides_only_model() {
        let prompt = PromptDefinition::new(
            "greeting",
            vec![ChatMessage::user("hi")],
            GenerationOptions::with_max_tokens(50),
        );
        let forced = prompt.with_model("gpt-4o");
        assert_eq!(forced.options.model.as_deref(), Some("gpt-4o"));
        assert_eq!(forced.options.max_tokens, Some(50));
        assert!(prompt.options.model.is_none());
    }
}
