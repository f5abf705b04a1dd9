pub mod azure_openai;
pub mod chat;
pub mod openai;

pub use azure_openai::AzureOpenAiExtractor;
pub use openai::OpenAiExtractor;

use crate::config::{ExtractionConfig, ExtractionProvider};
use crate::core::SchemaExtractor;
use crate::utils::error::Result;

pub fn build_extractor(config: &ExtractionConfig) -> Result<Box<dyn SchemaExtractor>> {
    match config.provider {
        ExtractionProvider::Openai => Ok(Box::new(OpenAiExtractor::from_config(config)?)),
        ExtractionProvider::AzureOpenai => Ok(Box::new(AzureOpenAiExtractor::from_config(config)?)),
    }
}
