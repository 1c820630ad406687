// Provider factory
//
// Creates the completion provider named in the configuration

use anyhow::{bail, Result};

use super::openai::OpenAIProvider;
use super::CompletionProvider;
use crate::config::CompletionConfig;
use crate::errors::api_key_missing_error;

/// Create a provider from the completion settings
///
/// Fails before any network traffic when the API key is missing.
pub fn create_provider(config: &CompletionConfig) -> Result<Box<dyn CompletionProvider>> {
    let Some(api_key) = config.api_key.clone() else {
        bail!(api_key_missing_error());
    };

    let provider: Box<dyn CompletionProvider> = match config.provider.as_str() {
        "openai" => Box::new(OpenAIProvider::from_config(api_key, config)?),
        other => bail!("Unknown provider: {}", other),
    };

    tracing::info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Using completion provider"
    );
    Ok(provider)
}
