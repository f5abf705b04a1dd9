use std::fmt;
use thiserror::Error;

/// Pipeline stage a run is in, or failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Configured,
    Scraping,
    Extracting,
    Saving,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Configured => "configuration",
            RunStage::Scraping => "scraping",
            RunStage::Extracting => "extraction",
            RunStage::Saving => "saving",
            RunStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Provider,
    Data,
    System,
}

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported language code '{code}' (supported: {supported})")]
    UnsupportedLanguageError { code: String, supported: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Scraping {url} failed: {message}")]
    ScrapeError { url: String, message: String },

    #[error("Model provider {provider} unavailable: {message}")]
    ModelUnavailableError { provider: String, message: String },

    #[error("Model response does not fit the recipe schema: {message}")]
    ExtractionParseError { message: String },

    #[error("Notes backend {backend} rejected the write: {message}")]
    NotesWriteError { backend: String, message: String },

    #[error("{stage} stage failed: {source}")]
    StageError {
        stage: RunStage,
        #[source]
        source: Box<RecipeError>,
    },
}

impl RecipeError {
    pub fn stage_failed(stage: RunStage, source: RecipeError) -> Self {
        RecipeError::StageError {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage the run failed in, if the error came out of `RecipeToNote::run`.
    pub fn stage(&self) -> Option<RunStage> {
        match self {
            RecipeError::StageError { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, skipping stage wrappers.
    pub fn root_cause(&self) -> &RecipeError {
        match self {
            RecipeError::StageError { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RecipeError::ConfigError { .. }
            | RecipeError::MissingConfigError { .. }
            | RecipeError::InvalidConfigValueError { .. }
            | RecipeError::UnsupportedLanguageError { .. } => ErrorCategory::Configuration,
            RecipeError::ApiError(_) | RecipeError::ScrapeError { .. } => ErrorCategory::Network,
            RecipeError::ModelUnavailableError { .. } | RecipeError::NotesWriteError { .. } => {
                ErrorCategory::Provider
            }
            RecipeError::SerializationError(_)
            | RecipeError::ValidationError { .. }
            | RecipeError::ExtractionParseError { .. } => ErrorCategory::Data,
            RecipeError::IoError(_) => ErrorCategory::System,
            RecipeError::StageError { source, .. } => source.category(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RecipeError::StageError { stage, source } => {
                format!("Recipe run failed during {}: {}", stage, source.root_cause())
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.root_cause() {
            RecipeError::ScrapeError { .. } => {
                "Check that the page is reachable and that the scraper API key is valid"
            }
            RecipeError::ModelUnavailableError { .. } => {
                "Check the model API key, model or deployment name and remaining quota"
            }
            RecipeError::ExtractionParseError { .. } => {
                "The model answered with something other than a recipe; try another model"
            }
            RecipeError::NotesWriteError { .. } => {
                "Check the notes token and that the database has the expected properties"
            }
            RecipeError::UnsupportedLanguageError { .. } => {
                "Pick one of the supported language codes or add it to the labels file"
            }
            RecipeError::ConfigError { .. }
            | RecipeError::MissingConfigError { .. }
            | RecipeError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or the corresponding environment variable"
            }
            RecipeError::ApiError(_) => "Check network connectivity and try again",
            RecipeError::ValidationError { .. } | RecipeError::SerializationError(_) => {
                "Inspect the logged payload for malformed data"
            }
            RecipeError::IoError(_) => "Check file paths and permissions",
            RecipeError::StageError { .. } => "Inspect the logs for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecipeError>;
