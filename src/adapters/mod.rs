// Adapters layer: concrete plugins for the scraper, extraction and notes roles.

pub mod extraction;
pub mod notes;
pub mod scraping;

pub use extraction::{build_extractor, AzureOpenAiExtractor, OpenAiExtractor};
pub use notes::{build_notes_app, NotionNotesApp};
pub use scraping::{build_scraper, SpiderScraper};
