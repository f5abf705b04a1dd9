pub mod notion;

pub use notion::NotionNotesApp;

use crate::config::{LocaleTable, NotesConfig, NotesProvider};
use crate::core::NotesApp;
use crate::utils::error::Result;

pub async fn build_notes_app(
    config: &NotesConfig,
    locale: &LocaleTable,
) -> Result<Box<dyn NotesApp>> {
    match config.provider {
        NotesProvider::Notion => Ok(Box::new(NotionNotesApp::connect(config, locale).await?)),
    }
}
