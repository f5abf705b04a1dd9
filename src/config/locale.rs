//! Note labels per language.
//!
//! The table is loaded once (normally from the embedded `locales/labels.toml`)
//! and never mutated afterwards. Plugins resolve their language once at
//! construction through [`LocaleTable::strings`], which fails for unknown codes
//! instead of falling back silently.

use crate::utils::error::{RecipeError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_LABELS: &str = include_str!("../../locales/labels.toml");

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKey {
    Ingredients,
    CookingTimeTemperature,
    Instructions,
    Hints,
    Url,
    Domain,
    UntitledRecipe,
}

/// Labels for one language. Deserialization fails if any label is missing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocaleStrings {
    pub ingredients: String,
    pub cooking_time_temperature: String,
    pub instructions: String,
    pub hints: String,
    pub url: String,
    pub domain: String,
    pub untitled_recipe: String,
}

impl LocaleStrings {
    pub fn get(&self, key: LabelKey) -> &str {
        match key {
            LabelKey::Ingredients => &self.ingredients,
            LabelKey::CookingTimeTemperature => &self.cooking_time_temperature,
            LabelKey::Instructions => &self.instructions,
            LabelKey::Hints => &self.hints,
            LabelKey::Url => &self.url,
            LabelKey::Domain => &self.domain,
            LabelKey::UntitledRecipe => &self.untitled_recipe,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocaleTable {
    languages: BTreeMap<String, LocaleStrings>,
}

impl LocaleTable {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_LABELS)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let languages: BTreeMap<String, LocaleStrings> =
            toml::from_str(content).map_err(|e| RecipeError::ConfigError {
                message: format!("Invalid labels file: {}", e),
            })?;

        if languages.is_empty() {
            return Err(RecipeError::ConfigError {
                message: "Labels file defines no languages".to_string(),
            });
        }

        for code in languages.keys() {
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(RecipeError::InvalidConfigValueError {
                    field: "labels".to_string(),
                    value: code.clone(),
                    reason: "Language codes must be two lowercase letters".to_string(),
                });
            }
        }

        Ok(Self { languages })
    }

    pub fn supported_codes(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    pub fn strings(&self, code: &str) -> Result<&LocaleStrings> {
        self.languages
            .get(code)
            .ok_or_else(|| RecipeError::UnsupportedLanguageError {
                code: code.to_string(),
                supported: self.supported_codes().join(", "),
            })
    }

    pub fn label(&self, code: &str, key: LabelKey) -> Result<&str> {
        Ok(self.strings(code)?.get(key))
    }
}
