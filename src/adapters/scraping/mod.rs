pub mod spider;

pub use spider::SpiderScraper;

use crate::config::{ScraperConfig, ScraperProvider};
use crate::core::Scraper;
use crate::utils::error::Result;

pub fn build_scraper(config: &ScraperConfig) -> Result<Box<dyn Scraper>> {
    match config.provider {
        ScraperProvider::Spider => Ok(Box::new(SpiderScraper::from_config(config)?)),
    }
}
