//! Nexus CLI: the main entry point.
//!
//! Commands:
//! - `template`: Manage and run prompt templates
//! - `profiles`: List agent profiles
//! - `agents`  : List configured agents
//! - `config`  : Show, locate or validate configuration

use clap::{Parser, Subcommand};

mod commands;

use commands::template::TemplateCommand;

#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Nexus: prompt template execution engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage and run prompt templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },

    /// List loaded agent profiles
    Profiles,

    /// List configured agents
    Agents,

    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration with secrets redacted
    Show,
    /// Print the config file location
    Path,
    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Template { action } => commands::template::run(action).await?,
        Commands::Profiles => commands::profiles::run().await?,
        Commands::Agents => commands::profiles::agents().await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
