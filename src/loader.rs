// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent loading of the index source and metadata files
//!
//! Each source is either a local path or an http(s) URL. Both are fetched at
//! the same time and both must succeed; there is no partial corpus.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::LoadError;
use crate::model::{Document, StoryMetadata};

pub const DEFAULT_INDEX_SOURCE: &str = "search-index.json";
pub const DEFAULT_METADATA_SOURCE: &str = "stories-metadata.json";

/// Where one input file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The pair of sources a session is built from
#[derive(Debug, Clone)]
pub struct Sources {
    pub index: Source,
    pub metadata: Source,
    pub timeout: Duration,
}

impl Sources {
    pub fn new(index: &str, metadata: &str) -> Self {
        Self {
            index: Source::parse(index),
            metadata: Source::parse(metadata),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parsed contents of both input files
#[derive(Debug)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub metadata: Vec<StoryMetadata>,
}

/// Fetch and parse both sources concurrently
pub async fn load(sources: &Sources) -> Result<LoadedCorpus, LoadError> {
    let client = reqwest::Client::builder()
        .timeout(sources.timeout)
        .build()
        .map_err(LoadError::Client)?;

    let (documents, metadata) = tokio::try_join!(
        fetch_json::<Vec<Document>>(&client, &sources.index),
        fetch_json::<Vec<StoryMetadata>>(&client, &sources.metadata),
    )?;

    info!(
        documents = documents.len(),
        metadata = metadata.len(),
        "loaded story corpus"
    );
    Ok(LoadedCorpus {
        documents,
        metadata,
    })
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    source: &Source,
) -> Result<T, LoadError> {
    let bytes = fetch_bytes(client, source).await?;
    debug!(source = %source, bytes = bytes.len(), "fetched source");
    serde_json::from_slice(&bytes).map_err(|error| LoadError::Parse {
        location: source.to_string(),
        error,
    })
}

async fn fetch_bytes(client: &reqwest::Client, source: &Source) -> Result<Vec<u8>, LoadError> {
    match source {
        Source::Path(path) => tokio::fs::read(path).await.map_err(|error| LoadError::Read {
            location: source.to_string(),
            error,
        }),
        Source::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|error| LoadError::Request {
                    location: url.clone(),
                    error,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    location: url.clone(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|error| LoadError::Request {
                location: url.clone(),
                error,
            })?;
            Ok(body.to_vec())
        }
    }
}
