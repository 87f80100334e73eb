// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for storysearch
//!
//! Loads configuration from .storysearchrc.toml in current directory or
//! ~/.config/storysearch/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::errors::ConfigError;
use crate::loader::{DEFAULT_INDEX_SOURCE, DEFAULT_METADATA_SOURCE};
use crate::pipeline::{DEFAULT_MAX_SNIPPETS_PER_STORY, DEFAULT_RESULT_LIMIT};
use crate::render::SNIPPET_MAX_CHARS;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Html,
    Text,
    Json,
}

/// How query terms are matched against indexed terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenize {
    /// Query terms match any indexed term they are a prefix of
    #[default]
    Forward,
    /// Query terms must equal an indexed term
    Strict,
}

/// Full-text index settings, the `[index]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub tokenize: Tokenize,
    /// Number of relevance levels scores are bucketed into
    pub resolution: u32,
    /// Maximum distance between query terms that still counts as proximity
    pub depth: u32,
    /// Also reward query terms appearing in reverse order
    pub bidirectional: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tokenize: Tokenize::Forward,
            resolution: 9,
            depth: 2,
            bidirectional: true,
        }
    }
}

/// Configuration loaded from .storysearchrc.toml or ~/.config/storysearch/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or http(s) URL of search-index.json
    pub index_source: Option<String>,
    /// Path or http(s) URL of stories-metadata.json
    pub metadata_source: Option<String>,
    /// Default output format (html, text or json)
    pub default_format: Option<String>,
    /// Idle time before a typed query runs, in milliseconds
    pub debounce_ms: Option<u64>,
    pub max_snippets_per_story: Option<usize>,
    pub snippet_max_chars: Option<usize>,
    /// Maximum documents requested from the index per field
    pub result_limit: Option<usize>,
    /// Timeout for fetching remote sources, in seconds
    pub fetch_timeout_secs: Option<u64>,
    pub index: IndexConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .storysearchrc.toml in current directory
    /// 2. ~/.config/storysearch/config.toml
    pub fn load() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(&PathBuf::from(".storysearchrc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("storysearch").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Load an explicitly requested config file, or fall back to [`Config::load`]
    ///
    /// Unlike the implicit locations, an explicit file must exist and parse.
    pub fn load_with_override(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
                    path: path.to_path_buf(),
                    error,
                })?;
                toml::from_str(&content).map_err(|error| ConfigError::Parse {
                    path: path.to_path_buf(),
                    error,
                })?
            }
            None => Self::load(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.resolution == 0 {
            return Err(ConfigError::Invalid("index.resolution must be >= 1".into()));
        }
        if self.max_snippets_per_story == Some(0) {
            return Err(ConfigError::Invalid(
                "max_snippets_per_story must be >= 1".into(),
            ));
        }
        if self.result_limit == Some(0) {
            return Err(ConfigError::Invalid("result_limit must be >= 1".into()));
        }
        if self.snippet_max_chars == Some(0) {
            return Err(ConfigError::Invalid("snippet_max_chars must be >= 1".into()));
        }
        Ok(())
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format.as_ref().and_then(|s| match s.to_lowercase().as_str() {
            "html" => Some(ConfigOutputFormat::Html),
            "text" => Some(ConfigOutputFormat::Text),
            "json" => Some(ConfigOutputFormat::Json),
            _ => None,
        })
    }

    /// Merge CLI options with config (CLI wins)
    pub fn merge_index_source(&self, cli_value: Option<&str>) -> String {
        cli_value
            .map(str::to_string)
            .or_else(|| self.index_source.clone())
            .unwrap_or_else(|| DEFAULT_INDEX_SOURCE.to_string())
    }

    pub fn merge_metadata_source(&self, cli_value: Option<&str>) -> String {
        cli_value
            .map(str::to_string)
            .or_else(|| self.metadata_source.clone())
            .unwrap_or_else(|| DEFAULT_METADATA_SOURCE.to_string())
    }

    pub fn merge_debounce(&self, cli_value: Option<u64>) -> Duration {
        cli_value
            .or(self.debounce_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    pub fn merge_max_snippets(&self, cli_value: Option<usize>) -> usize {
        cli_value
            .or(self.max_snippets_per_story)
            .unwrap_or(DEFAULT_MAX_SNIPPETS_PER_STORY)
    }

    pub fn merge_snippet_max_chars(&self, cli_value: Option<usize>) -> usize {
        cli_value
            .or(self.snippet_max_chars)
            .unwrap_or(SNIPPET_MAX_CHARS)
    }

    pub fn result_limit(&self) -> usize {
        self.result_limit.unwrap_or(DEFAULT_RESULT_LIMIT)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.merge_index_source(None), "search-index.json");
        assert_eq!(config.merge_metadata_source(None), "stories-metadata.json");
        assert_eq!(config.merge_debounce(None), Duration::from_millis(300));
        assert_eq!(config.merge_max_snippets(None), 3);
        assert_eq!(config.merge_snippet_max_chars(None), 400);
        assert_eq!(config.result_limit(), 100);
        assert_eq!(config.index, IndexConfig::default());
    }

    #[test]
    fn cli_values_win_over_file_values() {
        let config: Config = toml::from_str(
            r#"
index_source = "docs/search-index.json"
debounce_ms = 150
max_snippets_per_story = 2
"#,
        )
        .expect("parse");

        assert_eq!(config.merge_index_source(None), "docs/search-index.json");
        assert_eq!(config.merge_index_source(Some("other.json")), "other.json");
        assert_eq!(config.merge_debounce(None), Duration::from_millis(150));
        assert_eq!(config.merge_debounce(Some(10)), Duration::from_millis(10));
        assert_eq!(config.merge_max_snippets(None), 2);
    }

    #[test]
    fn index_table_parses() {
        let config: Config = toml::from_str(
            r#"
default_format = "JSON"

[index]
tokenize = "strict"
resolution = 5
"#,
        )
        .expect("parse");

        assert_eq!(config.output_format(), Some(ConfigOutputFormat::Json));
        assert_eq!(config.index.tokenize, Tokenize::Strict);
        assert_eq!(config.index.resolution, 5);
        assert_eq!(config.index.depth, 2);
        assert!(config.index.bidirectional);
    }

    #[test]
    fn explicit_config_must_exist_and_be_valid() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_with_override(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[index]\nresolution = 0\n").expect("write");
        assert!(matches!(
            Config::load_with_override(Some(&bad)),
            Err(ConfigError::Invalid(_))
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "debounce_ms = \"soon\"").expect("write");
        assert!(matches!(
            Config::load_with_override(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
