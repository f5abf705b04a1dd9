use super::chat::{ChatAuth, ChatCompletionsClient};
use crate::config::ExtractionConfig;
use crate::core::{Document, Recipe, SchemaExtractor};
use crate::utils::error::Result;
use crate::utils::validation::required_string;
use async_trait::async_trait;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiExtractor {
    chat: ChatCompletionsClient,
}

impl OpenAiExtractor {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, OPENAI_BASE_URL)
    }

    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Self {
        tracing::info!("Initializing OpenAI extraction with model: {}", model);
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self {
            chat: ChatCompletionsClient::new(
                "openai",
                endpoint,
                ChatAuth::Bearer(api_key),
                Some(model),
            ),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let api_key = required_string("extraction.api_key (OPENAI_API_KEY)", &config.api_key)?;
        let model = config
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let base_url = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
        Ok(Self::with_base_url(api_key, model, base_url))
    }
}

#[async_trait]
impl SchemaExtractor for OpenAiExtractor {
    async fn extract(&self, documents: &[Document], schema: &serde_json::Value) -> Result<Recipe> {
        self.chat.extract_recipe(documents, schema).await
    }
}
