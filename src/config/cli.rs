use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "recipes-to-notes")]
#[command(about = "Scrape a recipe page, extract it with a language model and save it as a note")]
pub struct CliConfig {
    /// Recipe page to process
    pub url: String,

    /// Path to a TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Language code for note labels (overrides the configuration)
    #[arg(short, long)]
    pub language: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}
