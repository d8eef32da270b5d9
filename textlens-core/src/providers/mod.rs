//! LLM provider implementations.
//!
//! Use `create_provider()` to instantiate the provider named in the config.

pub mod gemini;

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

pub use gemini::GeminiProvider;

/// Create the provider selected by `config.provider`.
pub fn create_provider(
    config: &LlmConfig,
    api_key: String,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" => {
            tracing::debug!(model = config.model.as_str(), "Creating Gemini provider");
            Ok(Arc::new(GeminiProvider::new(config, api_key)?))
        }
        other => Err(LlmError::UnsupportedProvider {
            provider: other.to_string(),
        }),
    }
}
