// Completion providers
//
// Stage drivers only need "prompt in, text out". This module hides the
// HTTP client behind a trait so drivers can be tested with canned replies.

use anyhow::Result;
use async_trait::async_trait;

pub mod factory;
pub mod openai;
pub mod types;

pub use factory::create_provider;
pub use openai::OpenAIProvider;
pub use types::{CompletionRequest, TokenLimit, TokenLimitField};

/// Trait for chat-completion backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the text of the first choice
    ///
    /// A response without content yields an empty string.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Provider name (e.g., "openai")
    fn name(&self) -> &str;

    /// Model used when the request leaves it empty
    fn default_model(&self) -> &str;
}
