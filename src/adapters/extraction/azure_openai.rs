use super::chat::{ChatAuth, ChatCompletionsClient};
use crate::config::ExtractionConfig;
use crate::core::{Document, Recipe, SchemaExtractor};
use crate::utils::error::{RecipeError, Result};
use crate::utils::validation::{parse_http_url, required_string};
use async_trait::async_trait;
use url::Url;

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Azure OpenAI deployment; the model is fixed by the deployment.
pub struct AzureOpenAiExtractor {
    chat: ChatCompletionsClient,
}

impl AzureOpenAiExtractor {
    pub fn new(
        azure_endpoint: &str,
        api_key: String,
        deployment: &str,
        api_version: &str,
    ) -> Result<Self> {
        let endpoint = deployment_endpoint(azure_endpoint, deployment, api_version)?;
        tracing::info!("Initializing Azure OpenAI extraction with deployment: {}", deployment);

        Ok(Self {
            chat: ChatCompletionsClient::new(
                "azure_openai",
                endpoint.to_string(),
                ChatAuth::ApiKeyHeader(api_key),
                None,
            ),
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let endpoint = required_string(
            "extraction.azure_endpoint (AZURE_OPENAI_ENDPOINT)",
            &config.azure_endpoint,
        )?;
        let api_key = required_string(
            "extraction.api_key (AZURE_OPENAI_API_KEY)",
            &config.api_key,
        )?;
        let deployment = required_string(
            "extraction.deployment (AZURE_OPENAI_DEPLOYMENT)",
            &config.deployment,
        )?;
        let api_version = config
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_AZURE_API_VERSION);
        Self::new(&endpoint, api_key, &deployment, api_version)
    }
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
fn deployment_endpoint(azure_endpoint: &str, deployment: &str, api_version: &str) -> Result<Url> {
    let mut url = parse_http_url("extraction.azure_endpoint", azure_endpoint)?;
    url.path_segments_mut()
        .map_err(|_| RecipeError::InvalidConfigValueError {
            field: "extraction.azure_endpoint".to_string(),
            value: azure_endpoint.to_string(),
            reason: "URL cannot have a path".to_string(),
        })?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment, "chat", "completions"]);
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

#[async_trait]
impl SchemaExtractor for AzureOpenAiExtractor {
    async fn extract(&self, documents: &[Document], schema: &serde_json::Value) -> Result<Recipe> {
        self.chat.extract_recipe(documents, schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::RecipeError;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_uses_deployment_path_and_api_key_header() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/deployments/recipes-gpt/chat/completions")
                .query_param("api-version", "2024-06-01")
                .header("api-key", "azure-key");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"name\": \"Bigos\"}"}}]
            }));
        });

        let extractor =
            AzureOpenAiExtractor::new(&server.base_url(), "azure-key".to_string(), "recipes-gpt", "2024-06-01")
                .unwrap();
        let recipe = extractor
            .extract(&[Document::new("Bigos")], &Recipe::json_schema())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(recipe.name.as_deref(), Some("Bigos"));
        assert!(recipe.ingredients.is_none());
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_model_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/openai/deployments/recipes-gpt/chat/completions");
            then.status(429).json_body(json!({
                "error": {"code": "429", "message": "Rate limit is exceeded"}
            }));
        });

        let extractor =
            AzureOpenAiExtractor::new(&server.base_url(), "azure-key".to_string(), "recipes-gpt", "2024-06-01")
                .unwrap();
        let result = extractor
            .extract(&[Document::new("Bigos")], &Recipe::json_schema())
            .await;

        match result {
            Err(RecipeError::ModelUnavailableError { provider, message }) => {
                assert_eq!(provider, "azure_openai");
                assert!(message.contains("429"));
            }
            other => panic!("expected ModelUnavailableError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_requires_deployment() {
        let config = ExtractionConfig {
            azure_endpoint: Some("https://example.openai.azure.com".to_string()),
            api_key: Some("azure-key".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            AzureOpenAiExtractor::from_config(&config),
            Err(RecipeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_deployment_and_version_are_encoded() {
        let extractor = AzureOpenAiExtractor::new(
            "https://example.openai.azure.com/",
            "azure-key".to_string(),
            "my deploy/x",
            "2024-06-01&debug=1",
        )
        .unwrap();

        assert_eq!(
            extractor.chat.endpoint(),
            "https://example.openai.azure.com/openai/deployments/my%20deploy%2Fx/chat/completions?api-version=2024-06-01%26debug%3D1"
        );
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(AzureOpenAiExtractor::new("not a url", "k".to_string(), "d", "v").is_err());
    }
}
