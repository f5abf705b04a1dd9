//! Chat-completions structured extraction shared by the OpenAI-compatible
//! providers.

use crate::core::{Document, Recipe};
use crate::utils::error::{RecipeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SYSTEM_PROMPT: &str = r#"You are a precise recipe extraction assistant. Your task is to extract cooking recipe information from scraped website content and return it in the specified structured format.

CRITICAL EXTRACTION RULES:
1. IGNORE ALL BOILERPLATE: Skip navigation menus, headers, footers, advertisements, social media links, related articles, comments, author bios, and any non-recipe content.

2. EXTRACT LITERALLY: Copy recipe information exactly as written. Do not:
   - Rephrase or rewrite instructions
   - Convert measurements or units
   - Standardize formatting
   - Correct grammar or spelling
   - Add missing information

3. NO GUESSING: If information is not explicitly provided in the content:
   - Leave the field as null
   - Do not infer or estimate values
   - Do not use placeholder text
   - Do not combine partial information to create complete entries

4. FOCUS ON RECIPE CONTENT ONLY: Look for:
   - Recipe title/name (usually in headings)
   - Ingredient lists (with exact quantities and descriptions)
   - Step-by-step cooking instructions
   - Cooking times, temperatures
   - Suggestions and/or hints
   - Recipe images (actual URLs, not placeholders)

5. PRESERVE ORIGINAL FORMAT:
   - Keep ingredients as separate list items exactly as listed
   - Maintain instruction steps as separate items
   - Preserve original wording and punctuation
   - Include quantities, measurements, and descriptive details as written

6. QUALITY CHECKS:
   - Ensure extracted content is actually recipe-related
   - Verify ingredient lists contain real ingredients, not navigation items
   - Confirm instructions are cooking steps, not website instructions
   - Only include image URLs that are actual recipe photos

Extract only what is clearly present and recipe-specific. When in doubt, omit the information rather than guess."#;

#[derive(Debug, Clone)]
pub enum ChatAuth {
    Bearer(String),
    ApiKeyHeader(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// One chat-completions endpoint plus its credentials.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    provider: &'static str,
    endpoint: String,
    auth: ChatAuth,
    model: Option<String>,
    client: Client,
}

impl ChatCompletionsClient {
    pub fn new(
        provider: &'static str,
        endpoint: String,
        auth: ChatAuth,
        model: Option<String>,
    ) -> Self {
        Self {
            provider,
            endpoint,
            auth,
            model,
            client: Client::new(),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unavailable(&self, message: String) -> RecipeError {
        RecipeError::ModelUnavailableError {
            provider: self.provider.to_string(),
            message,
        }
    }

    fn request_body<'a>(
        &'a self,
        content: &'a str,
        schema: &serde_json::Value,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: self.model.as_deref(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "Recipe",
                    "strict": true,
                    "schema": schema,
                }
            }),
        }
    }

    /// Sends the documents with a structured-output request and parses the
    /// answer into a recipe.
    pub async fn extract_recipe(
        &self,
        documents: &[Document],
        schema: &serde_json::Value,
    ) -> Result<Recipe> {
        let content = Document::concat(documents);
        if let Some(source) = documents
            .first()
            .and_then(|d| d.metadata.get("original_url"))
        {
            tracing::info!("Extracting schema from {} with {}", source, self.provider);
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(&content, schema));
        request = match &self.auth {
            ChatAuth::Bearer(key) => request.bearer_auth(key),
            ChatAuth::ApiKeyHeader(key) => request.header("api-key", key),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(self.unavailable(format!("status {}: {}", status, message)));
        }

        let recipe = parse_chat_response(&body)?;
        tracing::debug!("{} extracted recipe {:?}", self.provider, recipe.name);
        Ok(recipe)
    }
}

/// Pulls the recipe JSON out of a chat-completions response body.
pub fn parse_chat_response(body: &str) -> Result<Recipe> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| RecipeError::ExtractionParseError {
            message: format!("unexpected completion payload: {}", e),
        })?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| RecipeError::ExtractionParseError {
            message: "completion has no choices".to_string(),
        })?;

    if let Some(refusal) = message.refusal {
        return Err(RecipeError::ExtractionParseError {
            message: format!("model refused: {}", refusal),
        });
    }

    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| RecipeError::ExtractionParseError {
            message: "completion has no content".to_string(),
        })?;

    serde_json::from_str::<Recipe>(&content).map_err(|e| RecipeError::ExtractionParseError {
        message: format!("{}: {}", e, content),
    })
}
