// Request types for completion providers

use serde::{Deserialize, Serialize};

/// A single-prompt completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// User prompt text
    pub prompt: String,

    /// Optional system message sent before the prompt
    pub system: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Request field carrying the generation limit
///
/// Older chat models read `max_tokens`; newer reasoning models reject it
/// and read `max_completion_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLimitField {
    MaxTokens,
    #[default]
    MaxCompletionTokens,
}

impl TokenLimitField {
    /// Exactly `max_tokens` selects the legacy field; any other name selects
    /// `max_completion_tokens`
    pub fn from_name(name: &str) -> Self {
        if name == "max_tokens" {
            Self::MaxTokens
        } else {
            Self::MaxCompletionTokens
        }
    }
}

/// Generation limit and the field that carries it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLimit {
    pub value: u32,
    pub field: TokenLimitField,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("hello").with_system("be brief");
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_token_limit_field_names() {
        assert_eq!(TokenLimitField::from_name("max_tokens"), TokenLimitField::MaxTokens);
        assert_eq!(
            TokenLimitField::from_name("max_completion_tokens"),
            TokenLimitField::MaxCompletionTokens
        );
        assert_eq!(TokenLimitField::from_name("MAX_TOKENS"), TokenLimitField::MaxCompletionTokens);
        assert_eq!(TokenLimitField::from_name("bogus"), TokenLimitField::MaxCompletionTokens);
        assert_eq!(TokenLimitField::default(), TokenLimitField::MaxCompletionTokens);
    }
}
