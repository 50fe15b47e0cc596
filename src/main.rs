//! Colloquy CLI entry point.

use anyhow::Result;
use clap::Parser;
use colloquy::cli::{commands, Cli, Commands};
use colloquy::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("colloquy={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    if settings.general.load_dotenv {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to load .env: {}", e),
        }
    }

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Chat { model } => {
            commands::run_chat(model.clone(), settings).await?;
        }

        Commands::Research { model } => {
            commands::run_research(model.clone(), settings).await?;
        }

        Commands::Review { model } => {
            commands::run_review(model.clone(), settings).await?;
        }

        Commands::Docqa {
            pdf,
            replace,
            skip_ingest,
            collection,
            model,
        } => {
            commands::run_docqa(pdf, *replace, *skip_ingest, collection.clone(), model.clone(), settings).await?;
        }

        Commands::Ingest {
            pdf,
            replace,
            collection,
        } => {
            commands::run_ingest(pdf, *replace, collection.clone(), settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
            collection,
        } => {
            commands::run_search(query, *limit, *min_score, collection.clone(), settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
