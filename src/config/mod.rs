pub mod app_config;
#[cfg(feature = "cli")]
pub mod cli;
pub mod locale;

pub use app_config::{
    AppConfig, ExtractionConfig, ExtractionProvider, LocaleConfig, NotesConfig, NotesProvider,
    ScraperConfig, ScraperProvider,
};
#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use locale::{LabelKey, LocaleStrings, LocaleTable};

impl LocaleConfig {
    pub fn load_table(&self) -> crate::utils::error::Result<LocaleTable> {
        match &self.labels_file {
            Some(path) => LocaleTable::from_file(path),
            None => LocaleTable::builtin(),
        }
    }
}
