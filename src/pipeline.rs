// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-to-snippet pipeline
//!
//! The index decides which stories match; the displayed snippets are picked
//! here with a plain case-insensitive substring test over each story's
//! paragraphs, so what the reader sees is a literal hit whenever one exists.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::IndexError;
use crate::index::{FieldBatch, FieldHit, QueryOptions, StoryIndex};
use crate::model::{Document, Match, StoryMetadata};
use crate::store::{DocumentStore, MetadataStore};

/// Documents requested from the index per field
pub const DEFAULT_RESULT_LIMIT: usize = 100;
/// Snippets kept per story
pub const DEFAULT_MAX_SNIPPETS_PER_STORY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub result_limit: usize,
    pub max_snippets_per_story: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            result_limit: DEFAULT_RESULT_LIMIT,
            max_snippets_per_story: DEFAULT_MAX_SNIPPETS_PER_STORY,
        }
    }
}

/// Run a trimmed query end to end. An empty query is not an error and
/// yields no matches.
pub fn run_query(
    query: &str,
    index: &StoryIndex,
    documents: &DocumentStore,
    metadata: &MetadataStore,
    options: &PipelineOptions,
) -> Result<Vec<Match>, IndexError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let batches = index.search(
        query,
        &QueryOptions {
            limit: options.result_limit,
            enrich: true,
        },
    )?;
    Ok(collect_matches(query, &batches, documents, metadata, options))
}

/// Flatten per-field batches into matches, first occurrence of a story wins
pub fn collect_matches(
    query: &str,
    batches: &[FieldBatch],
    documents: &DocumentStore,
    metadata: &MetadataStore,
    options: &PipelineOptions,
) -> Vec<Match> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for batch in batches {
        for hit in &batch.hits {
            if !seen.insert(hit.id) {
                continue;
            }
            let (Some(document), Some(meta)) = (documents.get(hit.id), metadata.get(hit.id)) else {
                debug!(
                    id = hit.id,
                    field = batch.field.name(),
                    "skipping story without document or metadata"
                );
                continue;
            };
            if document.content.is_malformed() {
                debug!(id = hit.id, "story content is malformed, no snippet");
            }

            for (paragraph_index, text) in
                matching_paragraphs(document, query, options.max_snippets_per_story)
            {
                matches.push(build_match(document, meta, hit, paragraph_index, text));
            }
        }
    }

    matches
}

/// Paragraphs containing `query` (case-insensitive), in original order,
/// capped at `limit`. Falls back to the first paragraph when nothing
/// contains the literal query.
pub fn matching_paragraphs<'a>(
    document: &'a Document,
    query: &str,
    limit: usize,
) -> Vec<(usize, &'a str)> {
    let paragraphs = document.content.paragraphs();
    let needle = query.to_lowercase();

    let hits: Vec<(usize, &str)> = paragraphs
        .iter()
        .enumerate()
        .filter(|(_, paragraph)| paragraph.to_lowercase().contains(&needle))
        .map(|(index, paragraph)| (index, paragraph.as_str()))
        .take(limit)
        .collect();

    if !hits.is_empty() {
        return hits;
    }
    paragraphs
        .first()
        .map(|first| vec![(0, first.as_str())])
        .unwrap_or_default()
}

fn build_match(
    document: &Document,
    meta: &StoryMetadata,
    hit: &FieldHit,
    paragraph_index: usize,
    text: &str,
) -> Match {
    let stored = hit.stored.as_ref();
    let title = if meta.title.is_empty() {
        stored.map(|s| s.title.clone()).unwrap_or_default()
    } else {
        meta.title.clone()
    };
    let author = if meta.author.is_empty() {
        stored.map(|s| s.author.clone()).unwrap_or_default()
    } else {
        meta.author.clone()
    };

    Match {
        document_id: meta.id,
        title,
        subtitle: meta.subtitle.clone().filter(|s| !s.trim().is_empty()),
        url: meta.url.clone(),
        author,
        date: meta.date.clone().filter(|d| !d.trim().is_empty()),
        snippet_text: text.to_string(),
        paragraph_index,
        tags: if meta.tags.is_empty() {
            document.tags.clone()
        } else {
            meta.tags.clone()
        },
        score: hit.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::{IndexedField, StoredFields};
    use crate::model::{Content, StoryId};
    use std::collections::HashMap;

    fn story(id: StoryId, title: &str, paragraphs: &[&str]) -> Document {
        Document {
            id,
            title: title.to_string(),
            subtitle: None,
            author: format!("Author {id}"),
            content: Content::Paragraphs(paragraphs.iter().map(|p| p.to_string()).collect()),
            tags: vec![],
        }
    }

    fn meta_for(docs: &[Document]) -> Vec<StoryMetadata> {
        docs.iter()
            .map(|doc| StoryMetadata {
                id: doc.id,
                title: doc.title.clone(),
                subtitle: Some(String::new()),
                author: doc.author.clone(),
                date: Some("2024-03-09".to_string()),
                url: format!("https://example.org/p/{}", doc.id),
                word_count: None,
                tags: vec![],
            })
            .collect()
    }

    struct Fixture {
        index: StoryIndex,
        documents: DocumentStore,
        metadata: MetadataStore,
    }

    fn fixture(docs: Vec<Document>, meta: Vec<StoryMetadata>) -> Fixture {
        let index = StoryIndex::build(&docs, &IndexConfig::default()).expect("index");
        Fixture {
            index,
            documents: DocumentStore::new(docs),
            metadata: MetadataStore::new(meta),
        }
    }

    fn query(fx: &Fixture, q: &str) -> Vec<Match> {
        run_query(
            q,
            &fx.index,
            &fx.documents,
            &fx.metadata,
            &PipelineOptions::default(),
        )
        .expect("query")
    }

    fn hit(id: StoryId) -> FieldHit {
        FieldHit {
            id,
            score: 1.0,
            level: 0,
            stored: None,
        }
    }

    #[test]
    fn empty_query_yields_nothing() {
        let docs = vec![story(0, "A", &["protocol"])];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        assert!(query(&fx, "").is_empty());
        assert!(query(&fx, "   ").is_empty());
    }

    #[test]
    fn literal_paragraph_hits_are_returned_in_order() {
        let docs = vec![story(
            0,
            "Signals",
            &[
                "Opening lines.",
                "This is a strange protocol.",
                "Nothing here.",
                "Protocol again, capitalised.",
            ],
        )];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "protocol");
        let indexes: Vec<usize> = matches.iter().map(|m| m.paragraph_index).collect();
        assert_eq!(indexes, vec![1, 3]);
        assert_eq!(matches[0].snippet_text, "This is a strange protocol.");
        assert_eq!(matches[0].url, "https://example.org/p/0");
        assert_eq!(matches[0].subtitle, None);
    }

    #[test]
    fn at_most_three_snippets_per_story() {
        let paragraphs = ["echo one", "echo two", "echo three", "echo four", "echo five"];
        let docs = vec![story(0, "Echoes", &paragraphs)];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "echo");
        assert_eq!(matches.len(), 3);
        let indexes: Vec<usize> = matches.iter().map(|m| m.paragraph_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn title_only_match_falls_back_to_first_paragraph() {
        let docs = vec![story(0, "Lighthouse", &["First paragraph.", "Second."])];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "lighthouse");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].paragraph_index, 0);
        assert_eq!(matches[0].snippet_text, "First paragraph.");
    }

    #[test]
    fn prefix_match_without_literal_hit_falls_back() {
        // "prot" prefix-matches "protocol" but the literal "prot x" does not appear
        let docs = vec![story(0, "Notes", &["Intro.", "x marks the protocol"])];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "prot x");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].paragraph_index, 0);
    }

    #[test]
    fn empty_content_yields_no_snippet() {
        let docs = vec![story(0, "Hollow", &[])];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        assert!(query(&fx, "hollow").is_empty());
    }

    #[test]
    fn malformed_content_does_not_abort_the_query() {
        let mut broken = story(0, "Broken tide", &[]);
        broken.content = Content::Malformed;
        let docs = vec![broken, story(1, "Tide tables", &["The tide rolls in."])];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "tide");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].document_id, 1);
    }

    #[test]
    fn stories_without_metadata_are_skipped() {
        let docs = vec![
            story(0, "Orphan", &["harbor at dusk"]),
            story(1, "Kept", &["harbor at dawn"]),
        ];
        let meta: Vec<StoryMetadata> = meta_for(&docs).into_iter().filter(|m| m.id == 1).collect();
        let fx = fixture(docs, meta);

        let matches = query(&fx, "harbor");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].document_id, 1);
    }

    #[test]
    fn duplicate_ids_across_batches_keep_first_position() {
        let docs = vec![
            story(0, "Zero", &["river"]),
            story(1, "One", &["river"]),
            story(2, "Two", &["river"]),
        ];
        let meta = meta_for(&docs);
        let documents = DocumentStore::new(docs);
        let metadata = MetadataStore::new(meta);
        let batches = vec![
            FieldBatch {
                field: IndexedField::Title,
                hits: vec![hit(2)],
            },
            FieldBatch {
                field: IndexedField::Content,
                hits: vec![hit(0), hit(2), hit(1)],
            },
        ];

        let matches = collect_matches(
            "river",
            &batches,
            &documents,
            &metadata,
            &PipelineOptions::default(),
        );
        let order: Vec<StoryId> = matches.iter().map(|m| m.document_id).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn no_story_appears_twice_and_caps_hold() {
        let docs = vec![
            story(0, "Sea glass", &["sea", "sea again", "more sea", "sea sea"]),
            story(1, "Sea wall", &["the sea wall"]),
            story(2, "Inland", &["no water"]),
        ];
        let meta = meta_for(&docs);
        let fx = fixture(docs, meta);

        let matches = query(&fx, "sea");
        let mut per_story: HashMap<StoryId, usize> = HashMap::new();
        for m in &matches {
            *per_story.entry(m.document_id).or_default() += 1;
        }
        assert_eq!(per_story.len(), 2);
        assert!(per_story.values().all(|&count| count <= 3));

        let mut firsts = Vec::new();
        for m in &matches {
            if firsts.last() != Some(&m.document_id) {
                assert!(!firsts.contains(&m.document_id), "story split across result list");
                firsts.push(m.document_id);
            }
        }
    }

    #[test]
    fn enriched_fields_fill_blank_metadata() {
        let docs = vec![story(0, "Stored title", &["body"])];
        let documents = DocumentStore::new(docs);
        let metadata = MetadataStore::new(vec![StoryMetadata {
            id: 0,
            title: String::new(),
            subtitle: None,
            author: String::new(),
            date: None,
            url: "u".into(),
            word_count: None,
            tags: vec![],
        }]);
        let batches = vec![FieldBatch {
            field: IndexedField::Title,
            hits: vec![FieldHit {
                stored: Some(StoredFields {
                    title: "Stored title".into(),
                    subtitle: None,
                    author: "Stored author".into(),
                }),
                ..hit(0)
            }],
        }];

        let matches = collect_matches(
            "x",
            &batches,
            &documents,
            &metadata,
            &PipelineOptions::default(),
        );
        assert_eq!(matches[0].title, "Stored title");
        assert_eq!(matches[0].author, "Stored author");
    }

    #[test]
    fn matches_carry_score_and_tags() {
        let mut docs = vec![story(0, "Tagged", &["body"]), story(1, "Listed", &["body"])];
        docs[0].tags = vec!["from-document".into()];
        docs[1].tags = vec!["ignored".into()];
        let mut meta = meta_for(&docs);
        meta[1].tags = vec!["fiction".into(), "sea".into()];
        let documents = DocumentStore::new(docs);
        let metadata = MetadataStore::new(meta);
        let batches = vec![FieldBatch {
            field: IndexedField::Content,
            hits: vec![
                FieldHit {
                    score: 2.5,
                    ..hit(0)
                },
                hit(1),
            ],
        }];

        let matches = collect_matches(
            "body",
            &batches,
            &documents,
            &metadata,
            &PipelineOptions::default(),
        );
        assert_eq!(matches[0].score, 2.5);
        assert_eq!(matches[0].tags, vec!["from-document".to_string()]);
        assert_eq!(matches[1].score, 1.0);
        assert_eq!(matches[1].tags, vec!["fiction".to_string(), "sea".to_string()]);
    }
}
