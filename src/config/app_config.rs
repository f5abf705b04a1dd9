use crate::config::locale::DEFAULT_LANGUAGE;
use crate::utils::error::{RecipeError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub extraction: ExtractionConfig,
    pub notes: NotesConfig,
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScraperProvider {
    #[default]
    Spider,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub provider: ScraperProvider,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Extra request parameters passed through to the scraper API.
    pub params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionProvider {
    #[default]
    Openai,
    AzureOpenai,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub provider: ExtractionProvider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotesProvider {
    #[default]
    Notion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub provider: NotesProvider,
    pub token: Option<String>,
    pub database_id: Option<String>,
    pub database_name: Option<String>,
    pub language: String,
    pub title_property: String,
    /// Write the localized domain property; turn off for databases without it.
    pub domain_property: bool,
    pub base_url: Option<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            provider: NotesProvider::default(),
            token: None,
            database_id: None,
            database_name: None,
            language: DEFAULT_LANGUAGE.to_string(),
            title_property: "Name".to_string(),
            domain_property: true,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Alternate labels file; the embedded table is used when unset.
    pub labels_file: Option<String>,
}

impl AppConfig {
    /// Loads a TOML file, then fills unset credentials from the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: AppConfig =
            toml::from_str(&processed_content).map_err(|e| RecipeError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        config.apply_env();
        Ok(config)
    }

    /// Configuration built from environment variables only.
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();
        config.apply_env();
        config
    }

    /// Replaces `${VAR}` with the value of `VAR`; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RecipeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn apply_env(&mut self) {
        fill_from_env(&mut self.scraper.api_key, "SPIDER_API_KEY");

        match self.extraction.provider {
            ExtractionProvider::Openai => {
                fill_from_env(&mut self.extraction.api_key, "OPENAI_API_KEY");
                fill_from_env(&mut self.extraction.model, "OPENAI_MODEL");
                fill_from_env(&mut self.extraction.base_url, "OPENAI_BASE_URL");
            }
            ExtractionProvider::AzureOpenai => {
                fill_from_env(&mut self.extraction.api_key, "AZURE_OPENAI_API_KEY");
                fill_from_env(&mut self.extraction.azure_endpoint, "AZURE_OPENAI_ENDPOINT");
                fill_from_env(&mut self.extraction.deployment, "AZURE_OPENAI_DEPLOYMENT");
                fill_from_env(&mut self.extraction.api_version, "AZURE_OPENAI_API_VERSION");
            }
        }

        fill_from_env(&mut self.notes.token, "NOTION_TOKEN");
        fill_from_env(&mut self.notes.database_id, "NOTION_DATABASE_ID");
        fill_from_env(&mut self.notes.database_name, "NOTION_DATABASE_NAME");
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(base_url) = &self.scraper.base_url {
            validate_url("scraper.base_url", base_url)?;
        }
        if let Some(base_url) = &self.extraction.base_url {
            validate_url("extraction.base_url", base_url)?;
        }
        if let Some(endpoint) = &self.extraction.azure_endpoint {
            validate_url("extraction.azure_endpoint", endpoint)?;
        }
        if let Some(base_url) = &self.notes.base_url {
            validate_url("notes.base_url", base_url)?;
        }

        validate_non_empty_string("notes.language", &self.notes.language)?;
        validate_non_empty_string("notes.title_property", &self.notes.title_property)?;

        if self.notes.database_id.is_none() && self.notes.database_name.is_none() {
            return Err(RecipeError::MissingConfigError {
                field: "notes.database_id or notes.database_name (NOTION_DATABASE_ID / NOTION_DATABASE_NAME)"
                    .to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Fills `slot` from `var_name` when it is unset, blank, or an unresolved `${...}`.
fn fill_from_env(slot: &mut Option<String>, var_name: &str) {
    let unset = slot
        .as_deref()
        .map_or(true, |value| value.trim().is_empty() || value.starts_with("${"));
    if unset {
        *slot = None;
        if let Ok(value) = std::env::var(var_name) {
            if !value.trim().is_empty() {
                *slot = Some(value);
            }
        }
    }
}
