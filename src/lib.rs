pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{AppConfig, LocaleTable};
pub use core::runner::RecipeToNote;
pub use domain::model::{Document, EnrichedRecipe, Recipe};
pub use domain::ports::{NotesApp, SchemaExtractor, Scraper};
pub use utils::error::{RecipeError, Result, RunStage};
