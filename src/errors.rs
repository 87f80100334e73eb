// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Loading failures are fatal to a session; index failures during a query are
//! caught by the session and reported as a generic search error.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while fetching or parsing one of the two input files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "Failed to read '{location}': {error}\n\n\
         Suggestion: pass --index/--metadata, or set index_source and metadata_source \
         in .storysearchrc.toml"
    )]
    Read {
        location: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request for '{location}' failed: {error}")]
    Request {
        location: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("'{location}' returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error(
        "'{location}' is not a valid story file: {error}\n\n\
         Suggestion: regenerate the file with the scraper"
    )]
    Parse {
        location: String,
        #[source]
        error: serde_json::Error,
    },
}

/// Failure inside the full-text index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
}

/// Failure while bringing a search session up
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to build the story index: {0}")]
    Index(#[from] IndexError),
}

/// Invalid or unreadable configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {error}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to parse config file {}: {error}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
