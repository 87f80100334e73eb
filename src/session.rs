// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide search session
//!
//! A [`SearchSession`] owns both stores and the index. It is built once after
//! a successful load and is read-only afterwards, so it can be shared by
//! reference (or `Arc`) with anything that runs queries.

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::errors::{IndexError, SessionError};
use crate::index::StoryIndex;
use crate::loader::{self, Sources};
use crate::model::{Document, Match, StoryMetadata};
use crate::pipeline::{self, PipelineOptions};
use crate::render::{self, RenderOptions, ResultsView};
use crate::store::{DocumentStore, MetadataStore};

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub index: IndexConfig,
    pub pipeline: PipelineOptions,
    pub render: RenderOptions,
}

/// Result of one query, successful or not
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub matches: Vec<Match>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn story_count(&self) -> usize {
        self.matches
            .iter()
            .map(|m| m.document_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Corpus summary for the `stats` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub stories: usize,
    pub paragraphs: usize,
    pub words: u64,
    /// Whole words per story, rounded down
    pub avg_words_per_story: u64,
    pub authors: usize,
    /// Distinct tags across metadata and documents
    pub tags: usize,
    pub missing_metadata: usize,
    pub malformed_content: usize,
}

#[derive(Debug)]
pub struct SearchSession {
    documents: DocumentStore,
    metadata: MetadataStore,
    index: StoryIndex,
    options: SessionOptions,
}

impl SearchSession {
    /// Fetch both sources concurrently, then build stores and index
    pub async fn load(sources: &Sources, options: SessionOptions) -> Result<Self, SessionError> {
        let corpus = loader::load(sources).await?;
        Ok(Self::from_parts(corpus.documents, corpus.metadata, options)?)
    }

    pub fn from_parts(
        documents: Vec<Document>,
        metadata: Vec<StoryMetadata>,
        options: SessionOptions,
    ) -> Result<Self, IndexError> {
        let index = StoryIndex::build(&documents, &options.index)?;
        Ok(Self {
            documents: DocumentStore::new(documents),
            metadata: MetadataStore::new(metadata),
            index,
            options,
        })
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Run the pipeline, propagating index failures
    pub fn query(&self, query: &str) -> Result<Vec<Match>, IndexError> {
        pipeline::run_query(
            query,
            &self.index,
            &self.documents,
            &self.metadata,
            &self.options.pipeline,
        )
    }

    /// Run a query, catching index failures so the session stays usable
    pub fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        let started = Instant::now();
        let outcome = match self.query(query) {
            Ok(matches) => SearchOutcome {
                query: query.to_string(),
                matches,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, query, "search failed");
                SearchOutcome {
                    query: query.to_string(),
                    matches: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        debug!(
            query,
            matches = outcome.matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );
        outcome
    }

    /// Results view for an outcome produced by this session
    pub fn view(&self, outcome: &SearchOutcome) -> ResultsView {
        if outcome.error.is_some() {
            return ResultsView::search_error();
        }
        render::render_results(&outcome.matches, &outcome.query, &self.options.render)
    }

    pub fn stats(&self) -> CorpusStats {
        let mut seen = HashSet::new();
        let mut authors = HashSet::new();
        let mut tags = HashSet::new();
        let mut paragraphs = 0usize;
        let mut words = 0u64;
        let mut missing_metadata = 0usize;
        let mut malformed_content = 0usize;

        // Repeated ids resolve to their first document everywhere else
        for document in self.documents.iter().filter(|d| seen.insert(d.id)) {
            let meta = self.metadata.get(document.id);
            if meta.is_none() {
                missing_metadata += 1;
            }
            if document.content.is_malformed() {
                malformed_content += 1;
            }
            let author = meta.map_or(document.author.as_str(), |m| m.author.as_str());
            if !author.trim().is_empty() {
                authors.insert(author.trim().to_lowercase());
            }
            let story_tags = match meta {
                Some(m) if !m.tags.is_empty() => &m.tags,
                _ => &document.tags,
            };
            tags.extend(
                story_tags
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty()),
            );

            let body = document.content.paragraphs();
            paragraphs += body.len();
            words += meta.and_then(|m| m.word_count).unwrap_or_else(|| {
                body.iter()
                    .map(|p| p.split_whitespace().count() as u64)
                    .sum()
            });
        }

        let stories = seen.len();
        CorpusStats {
            stories,
            paragraphs,
            words,
            avg_words_per_story: if stories == 0 { 0 } else { words / stories as u64 },
            authors: authors.len(),
            tags: tags.len(),
            missing_metadata,
            malformed_content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Content;

    fn corpus() -> (Vec<Document>, Vec<StoryMetadata>) {
        let documents: Vec<Document> = serde_json::from_str(
            r#"[
                {"id":0,"title":"Signals","author":"Ann Lee",
                 "content":["Opening.","This is a strange protocol."]},
                {"id":1,"title":"Hollow","author":"Bo Chen","content":[]},
                {"id":2,"title":"Unlisted","author":"Cy","content":["protocol hidden"]}
            ]"#,
        )
        .expect("documents");
        let metadata: Vec<StoryMetadata> = serde_json::from_str(
            r#"[
                {"id":0,"title":"Signals","author":"Ann Lee","url":"https://example.org/signals",
                 "date":"2022-11-02","wordCount":6},
                {"id":1,"title":"Hollow","author":"Bo Chen","url":"https://example.org/hollow"}
            ]"#,
        )
        .expect("metadata");
        (documents, metadata)
    }

    fn session() -> SearchSession {
        let (documents, metadata) = corpus();
        SearchSession::from_parts(documents, metadata, SessionOptions::default()).expect("session")
    }

    #[test]
    fn protocol_example_renders_highlighted_card() {
        let session = session();
        let outcome = session.search("protocol");

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.story_count(), 1);
        let view = session.view(&outcome);
        assert_eq!(view.count_text, "1 match in 1 story");
        assert!(view.cards[0].contains("This is a strange <mark>protocol</mark>."));
        assert!(view.cards[0].contains("https://example.org/signals"));
        assert!(view.cards[0].contains("November 2, 2022"));
    }

    #[test]
    fn empty_content_story_matching_on_title_yields_nothing() {
        let session = session();
        let outcome = session.search("hollow");

        assert!(outcome.matches.is_empty());
        assert!(outcome.error.is_none());
        assert_eq!(session.view(&outcome).count_text, "0 matches in 0 stories");
    }

    #[test]
    fn empty_query_is_cleared_not_an_error() {
        let session = session();
        let outcome = session.search("   ");

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.query, "");
        assert_eq!(session.view(&outcome), ResultsView::cleared());
    }

    #[test]
    fn error_outcome_renders_generic_message() {
        let session = session();
        let outcome = SearchOutcome {
            query: "x".into(),
            matches: vec![],
            error: Some("boom".into()),
        };
        assert_eq!(session.view(&outcome).count_text, "A search error occurred");
    }

    #[test]
    fn stats_summarise_corpus() {
        let (mut documents, metadata) = corpus();
        documents[1].content = Content::Malformed;
        let session =
            SearchSession::from_parts(documents, metadata, SessionOptions::default()).expect("session");

        let stats = session.stats();
        assert_eq!(stats.stories, 3);
        assert_eq!(stats.paragraphs, 3);
        // 6 from metadata for story 0, 2 counted for story 2
        assert_eq!(stats.words, 8);
        assert_eq!(stats.authors, 3);
        assert_eq!(stats.missing_metadata, 1);
        assert_eq!(stats.malformed_content, 1);
        assert_eq!(stats.avg_words_per_story, 2);
        assert_eq!(stats.tags, 0);
    }

    #[test]
    fn stats_count_repeated_ids_once() {
        let (mut documents, mut metadata) = corpus();
        let mut repeat = documents[0].clone();
        repeat.content = Content::Paragraphs(vec!["Extra words that never count.".into()]);
        documents.push(repeat);
        documents[2].tags = vec!["Sea".into(), " ".into()];
        metadata[0].tags = vec!["sea".into(), "radio".into()];
        let session =
            SearchSession::from_parts(documents, metadata, SessionOptions::default()).expect("session");

        let stats = session.stats();
        assert_eq!(stats.stories, 3);
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.words, 8);
        assert_eq!(stats.tags, 2);
    }
}
