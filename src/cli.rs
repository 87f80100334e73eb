// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// storysearch - Search scraped stories by paragraph
///
/// Loads search-index.json and stories-metadata.json (local paths or URLs),
/// indexes them in memory and prints highlighted paragraph snippets.
#[derive(Parser, Debug)]
#[command(name = "storysearch")]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Search quickstart:\n  storysearch search protocol\n  storysearch --format text s \"harbor lights\"\n  storysearch --index https://example.org/search-index.json --metadata https://example.org/stories-metadata.json search tide\n\nInteractive mode reads one query per line; a line holding only ESC clears the results."
)]
pub struct Cli {
    /// Index source: path or http(s) URL of search-index.json
    #[arg(long, global = true, value_name = "SRC")]
    pub index: Option<String>,

    /// Metadata source: path or http(s) URL of stories-metadata.json
    #[arg(long, global = true, value_name = "SRC")]
    pub metadata: Option<String>,

    /// Output format (html, text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Configuration file (defaults to .storysearchrc.toml, then ~/.config/storysearch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Result cards as an HTML fragment
    Html,
    /// Plain text for terminals
    Text,
    /// Matches as JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one query and print the results
    #[command(visible_aliases = ["s"])]
    Search {
        /// Search query
        query: String,

        /// Maximum snippets per story (default: 3)
        #[arg(short = 'n', long = "max-snippets")]
        max_snippets: Option<usize>,

        /// Maximum characters per snippet (default: 400)
        #[arg(short = 'c', long = "max-chars")]
        max_chars: Option<usize>,
    },

    /// Read queries from stdin as they are typed, debounced
    #[command(visible_aliases = ["i"])]
    Interactive {
        /// Idle time in milliseconds before a query runs (default: 300)
        #[arg(short = 'd', long)]
        debounce: Option<u64>,
    },

    /// Print corpus statistics
    Stats,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
