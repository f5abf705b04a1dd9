use crate::domain::model::{Document, EnrichedRecipe, Recipe};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Turns a page URL into text documents.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Vec<Document>>;
}

/// Extracts a structured recipe from scraped documents.
///
/// `schema` is the JSON schema the answer has to match. Implementations return
/// `RecipeError::ExtractionParseError` when the model answered but the answer
/// does not fit the schema, and `RecipeError::ModelUnavailableError` when the
/// model could not be reached at all.
#[async_trait]
pub trait SchemaExtractor: Send + Sync {
    async fn extract(&self, documents: &[Document], schema: &serde_json::Value) -> Result<Recipe>;
}

/// Persists an enriched recipe as a note.
#[async_trait]
pub trait NotesApp: Send + Sync {
    async fn create_note(&self, recipe: EnrichedRecipe) -> Result<()>;
}

#[async_trait]
impl<T: Scraper + ?Sized> Scraper for Box<T> {
    async fn scrape(&self, url: &str) -> Result<Vec<Document>> {
        (**self).scrape(url).await
    }
}

#[async_trait]
impl<T: SchemaExtractor + ?Sized> SchemaExtractor for Box<T> {
    async fn extract(&self, documents: &[Document], schema: &serde_json::Value) -> Result<Recipe> {
        (**self).extract(documents, schema).await
    }
}

#[async_trait]
impl<T: NotesApp + ?Sized> NotesApp for Box<T> {
    async fn create_note(&self, recipe: EnrichedRecipe) -> Result<()> {
        (**self).create_note(recipe).await
    }
}
