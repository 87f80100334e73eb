//! storysearch - Static story search
//!
//! Fetches a scraped story corpus, indexes it with tantivy and prints
//! highlighted paragraph snippets as HTML, text or JSON.

mod cli;
mod query;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat};
use storysearch::config::{Config, ConfigOutputFormat};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_format(cli_format: Option<OutputFormat>, config: &Config) -> OutputFormat {
    cli_format.unwrap_or(match config.output_format() {
        Some(ConfigOutputFormat::Text) => OutputFormat::Text,
        Some(ConfigOutputFormat::Json) => OutputFormat::Json,
        Some(ConfigOutputFormat::Html) | None => OutputFormat::Html,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "storysearch", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_with_override(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let format = resolve_format(cli.format, &config);
    let sources = query::SourceArgs {
        index: cli.index.as_deref(),
        metadata: cli.metadata.as_deref(),
    };

    match cli.command {
        Commands::Search {
            query,
            max_snippets,
            max_chars,
        } => {
            query::search::run(&query, &sources, &config, max_snippets, max_chars, format).await?;
        }
        Commands::Interactive { debounce } => {
            query::interactive::run(&sources, &config, debounce, format).await?;
        }
        Commands::Stats => {
            query::stats::run(&sources, &config, format).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
