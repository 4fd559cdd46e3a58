mod anthropic;
mod lines;
mod openai;

pub use anthropic::AnthropicProvider;
pub use lines::DataLines;
pub use openai::OpenAiProvider;

use crate::core::config::{AppConfig, ProviderKind};
use crate::core::error::ProviderError;
use crate::core::provider::Provider;
use std::sync::Arc;


/// Create the provider selected by `config.provider`.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let kind = config.provider_kind();
    let Some(api_key) = config.api_key().map(str::to_string) else {
        return Err(ProviderError::MissingApiKey(missing_key_hint(kind)));
    };

    tracing::debug!(provider = %kind, model = %config.model_name(), "creating provider");

    match kind {
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::new(config))),
        ProviderKind::DeepSeek | ProviderKind::OpenAi => {
            Ok(Arc::new(OpenAiProvider::new(config, api_key)))
        }
    }
}

pub fn missing_key_hint(kind: ProviderKind) -> String {
    match kind {
        ProviderKind::Anthropic => {
            "ANTHROPIC_API_KEY or ANTHROPIC_AUTH_TOKEN not set. Set via env var or config file."
                .into()
        }
        ProviderKind::DeepSeek => "DEEPSEEK_API_KEY not set. Set via env var or config file.".into(),
        ProviderKind::OpenAi => "OPENAI_API_KEY not set. Set via env var or config file.".into(),
    }
}
