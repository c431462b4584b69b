pub mod error;
pub mod gemini;
pub mod types;

use async_trait::async_trait;
use tracing::warn;

use crate::config::Config;

pub use error::AiError;
pub use gemini::GeminiClient;
pub use types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateConfig,
    GenerateRequest, GenerateResponse, Part, Role, Tool,
};

/// Anything that can answer a `generateContent` request.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError>;
}

/// Build a fresh Gemini handle from the current configuration.
///
/// A missing credential is only warned about; the client is still built with
/// an empty key and the first request fails with an auth error instead.
pub fn get_ai(config: &Config) -> GeminiClient {
    let api_key = config.resolve_api_key().unwrap_or_else(|| {
        warn!(
            "Gemini API key is missing. Set VITE_API_KEY or GEMINI_API_KEY, \
             or add api_key to the config file."
        );
        String::new()
    });
    GeminiClient::new(&api_key, config.gemini_base_url())
}
