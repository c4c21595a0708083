//! Tutor CLI
//!
//! Main entry point for the retrieval-augmented tutor.
//! Provides an interactive chat session, a one-shot ask command, and a
//! corpus inspection command.

mod commands;
mod session;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, CorpusCommand};
use std::path::PathBuf;
use tutor_core::{logging, AppConfig, AppResult};

/// Tutor CLI - retrieval-augmented chat tutoring over a course text
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Retrieval-augmented chat tutor", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "TUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the corpus document
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Generation provider
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive tutoring session
    Chat(ChatCommand),

    /// Ask a single question and exit
    Ask(AskCommand),

    /// Build and inspect the corpus index
    Corpus(CorpusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration, then apply CLI overrides
    let config = AppConfig::load(cli.config.as_ref())?;
    let config = config.with_overrides(
        cli.corpus,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Tutor CLI starting");
    tracing::debug!("Corpus: {:?}", config.corpus_path);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Chat(_) => "chat",
        Commands::Ask(_) => "ask",
        Commands::Corpus(_) => "corpus",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Corpus(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
