// SPDX-License-Identifier: MIT OR Apache-2.0

//! Story documents, display metadata and per-query matches
//!
//! Both input files are produced by the offline scraper. Parsing is lenient
//! about optional and unknown fields so that a single odd record does not
//! take the whole corpus down.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stable story identifier shared by the index source and the metadata file
pub type StoryId = u64;

/// One scraped story as stored in `search-index.json`
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: StoryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: Content,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
}

/// Paragraph sequence of a story.
///
/// Anything other than an array of strings is kept as [`Content::Malformed`]
/// instead of failing the load; such a story is still indexed on its other
/// fields but never yields a snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Content {
    Paragraphs(Vec<String>),
    #[default]
    Malformed,
}

impl Content {
    pub fn paragraphs(&self) -> &[String] {
        match self {
            Content::Paragraphs(paragraphs) => paragraphs,
            Content::Malformed => &[],
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Content::Malformed)
    }

    /// Paragraphs joined into one string, for indexing only
    pub fn flattened(&self) -> String {
        self.paragraphs().join("\n\n")
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(string_list(value).map_or(Content::Malformed, Content::Paragraphs))
    }
}

/// Display metadata for one story as stored in `stories-metadata.json`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    pub id: StoryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
}

/// A single paragraph-level hit, produced fresh for every query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub document_id: StoryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub url: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub snippet_text: String,
    pub paragraph_index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Index score of the field hit that surfaced the story
    pub score: f32,
}

fn string_list(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_list(value).unwrap_or_default())
}
