use crate::utils::error::Result;
use crate::utils::validation::parse_http_url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// A piece of scraped page content, ideally already markdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Contents of all documents in scraped order, separated by a blank line.
    pub fn concat(documents: &[Document]) -> String {
        documents
            .iter()
            .map(|d| d.page_content.trim())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Cooking recipe extracted from a website. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub cooking_time_temperature: Option<String>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
    #[serde(default)]
    pub hints: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Recipe {
    pub fn is_empty(&self) -> bool {
        *self == Recipe::default()
    }

    /// JSON schema of the recipe shape, usable as a strict structured-output
    /// schema: every property is required and nullable.
    pub fn json_schema() -> serde_json::Value {
        json!({
            "title": "Recipe",
            "description": "Cooking recipe extracted from a website",
            "type": "object",
            "properties": {
                "name": {
                    "type": ["string", "null"],
                    "description": "The exact title/name of the recipe as it appears on the website. Do not modify or guess."
                },
                "ingredients": {
                    "type": ["array", "null"],
                    "items": { "type": "string" },
                    "description": "List of ingredients exactly as written on the website, including quantities and measurements. Each ingredient should be a separate list item. Do not modify the text or format."
                },
                "cooking_time_temperature": {
                    "type": ["string", "null"],
                    "description": "Cooking time, baking temperature, or any time/temperature information as stated on the website. Combine cooking and time information into a single string if multiple values are provided. Isolate from other instructions."
                },
                "instructions": {
                    "type": ["array", "null"],
                    "items": { "type": "string" },
                    "description": "Step-by-step cooking instructions exactly as written on the website. Each step should be a separate list item. Preserve the original wording and formatting."
                },
                "hints": {
                    "type": ["string", "null"],
                    "description": "Additional instructions and/or suggestions on top of the main instructions."
                },
                "image_url": {
                    "type": ["string", "null"],
                    "description": "URL of the main recipe image if explicitly provided. Only include if a clear image URL is present in the content."
                }
            },
            "required": [
                "name",
                "ingredients",
                "cooking_time_temperature",
                "instructions",
                "hints",
                "image_url"
            ],
            "additionalProperties": false
        })
    }
}

/// A recipe together with the page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub url: String,
    pub domain: String,
}

impl EnrichedRecipe {
    /// Attaches the source URL; the domain is the URL host as written
    /// (`www.` is kept, the port is dropped).
    pub fn from_recipe(recipe: Recipe, url: &str) -> Result<Self> {
        let parsed = parse_http_url("url", url)?;
        let domain = parsed.host_str().unwrap_or_default().to_string();

        Ok(Self {
            recipe,
            url: url.to_string(),
            domain,
        })
    }
}
