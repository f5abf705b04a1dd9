use clap::Parser;
use recipes_to_notes::adapters::{build_extractor, build_notes_app, build_scraper};
use recipes_to_notes::core::{NotesApp, SchemaExtractor, Scraper};
use recipes_to_notes::utils::{logger, validation::Validate};
use recipes_to_notes::{AppConfig, CliConfig, RecipeError, RecipeToNote};

type BoxedRunner = RecipeToNote<Box<dyn Scraper>, Box<dyn SchemaExtractor>, Box<dyn NotesApp>>;

fn exit_with(error: &RecipeError, code: i32) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?})",
        error,
        error.category()
    );
    tracing::error!("💡 Suggestion: {}", error.recovery_suggestion());
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(code);
}

fn load_config(cli: &CliConfig) -> Result<AppConfig, RecipeError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            AppConfig::from_file(path)?
        }
        None => {
            tracing::info!("📁 No configuration file given, using environment variables");
            AppConfig::from_env()
        }
    };

    if let Some(language) = &cli.language {
        config.notes.language = language.clone();
        tracing::info!("🔧 Note language overridden to: {}", language);
    }

    config.validate()?;
    Ok(config)
}

async fn build_runner(cli: &CliConfig, config: &AppConfig) -> Result<BoxedRunner, RecipeError> {
    let locale = config.locale.load_table()?;
    let scraper = build_scraper(&config.scraper)?;
    let extractor = build_extractor(&config.extraction)?;
    let notes_app = build_notes_app(&config.notes, &locale).await?;

    let mut runner = RecipeToNote::new(scraper, extractor, notes_app);
    runner.url(&cli.url)?;
    Ok(runner)
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting recipes-to-notes");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => exit_with(&e, 1),
    };
    tracing::info!(
        "✅ Configuration loaded (scraper: {:?}, extraction: {:?}, notes: {:?}, language: {})",
        config.scraper.provider,
        config.extraction.provider,
        config.notes.provider,
        config.notes.language
    );

    let mut runner = match build_runner(&cli, &config).await {
        Ok(runner) => runner,
        Err(e) => exit_with(&e, 1),
    };

    match runner.run().await {
        Ok(()) => {
            tracing::info!("✅ Recipe from {} saved as a note", cli.url);
            println!("✅ Recipe from {} saved as a note", cli.url);
        }
        Err(e) => exit_with(&e, 2),
    }
}
