use crate::core::{Document, EnrichedRecipe, NotesApp, Recipe, Scraper, SchemaExtractor};
use crate::utils::error::{RecipeError, Result, RunStage};
use crate::utils::validation::validate_url;

/// Drives one recipe page through scrape -> extract -> save.
pub struct RecipeToNote<S: Scraper, E: SchemaExtractor, N: NotesApp> {
    scraper: S,
    extractor: E,
    notes_app: N,
    url: Option<String>,
    stage: RunStage,
}

impl<S: Scraper, E: SchemaExtractor, N: NotesApp> RecipeToNote<S, E, N> {
    pub fn new(scraper: S, extractor: E, notes_app: N) -> Self {
        Self {
            scraper,
            extractor,
            notes_app,
            url: None,
            stage: RunStage::Configured,
        }
    }

    /// Sets the recipe page to process and resets the stage.
    pub fn url(&mut self, url: &str) -> Result<&mut Self> {
        validate_url("url", url)?;
        self.url = Some(url.to_string());
        self.stage = RunStage::Configured;
        Ok(self)
    }

    pub fn configured_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Stage of the last run; a failed run stays at the stage it failed in.
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub async fn run(&mut self) -> Result<()> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| RecipeError::MissingConfigError {
                field: "url".to_string(),
            })?;

        tracing::info!(url = %url, "Starting recipe run");

        self.stage = RunStage::Scraping;
        let documents = self.scrape(&url).await?;
        tracing::info!("Scraped {} documents from {}", documents.len(), url);

        self.stage = RunStage::Extracting;
        let recipe = self.extract(&documents).await?;
        if recipe.is_empty() {
            tracing::warn!("No recipe fields extracted from {}", url);
        } else {
            tracing::info!(
                "Extracted recipe {:?} from {}",
                recipe.name.as_deref().unwrap_or("<unnamed>"),
                url
            );
        }

        self.stage = RunStage::Saving;
        let enriched = EnrichedRecipe::from_recipe(recipe, &url)
            .map_err(|e| RecipeError::stage_failed(RunStage::Saving, e))?;
        tracing::debug!("Saving note for {} ({})", enriched.url, enriched.domain);
        self.notes_app
            .create_note(enriched)
            .await
            .map_err(|e| RecipeError::stage_failed(RunStage::Saving, e))?;

        self.stage = RunStage::Done;
        tracing::info!("Recipe run for {} completed", url);
        Ok(())
    }

    async fn scrape(&self, url: &str) -> Result<Vec<Document>> {
        let documents = self
            .scraper
            .scrape(url)
            .await
            .map_err(|e| RecipeError::stage_failed(RunStage::Scraping, e))?;

        if documents
            .iter()
            .all(|document| document.page_content.trim().is_empty())
        {
            let message = if documents.is_empty() {
                "scraper returned no documents"
            } else {
                "scraped documents have no content"
            };
            return Err(RecipeError::stage_failed(
                RunStage::Scraping,
                RecipeError::ScrapeError {
                    url: url.to_string(),
                    message: message.to_string(),
                },
            ));
        }

        Ok(documents)
    }

    async fn extract(&self, documents: &[Document]) -> Result<Recipe> {
        let schema = Recipe::json_schema();
        match self.extractor.extract(documents, &schema).await {
            Ok(recipe) => Ok(recipe),
            Err(RecipeError::ExtractionParseError { message }) => {
                tracing::warn!(
                    "Extraction response did not match the recipe schema, saving an empty recipe: {}",
                    message
                );
                Ok(Recipe::default())
            }
            Err(e) => Err(RecipeError::stage_failed(RunStage::Extracting, e)),
        }
    }
}
