pub mod runner;

pub use crate::domain::model::{Document, EnrichedRecipe, Recipe};
pub use crate::domain::ports::{NotesApp, Scraper, SchemaExtractor};
pub use crate::utils::error::Result;
