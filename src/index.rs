// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-text story index backed by tantivy
//!
//! # Schema
//!
//! | Field | Options | Source |
//! |-------|---------|--------|
//! | `id` | `u64`, `STORED \| FAST \| INDEXED` | `Document::id` |
//! | `title` | text, stored | `Document::title` |
//! | `subtitle` | text, stored | `Document::subtitle` (absent if `None`) |
//! | `author` | text, stored | `Document::author` |
//! | `content` | text, not stored | paragraphs joined with blank lines |
//!
//! Every field is searched on its own so callers get one ranked batch per
//! field, in the order title, subtitle, author, content.

use tantivy::collector::TopDocs;
use tantivy::query::{
    BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST, INDEXED, STORED,
};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use crate::config::{IndexConfig, Tokenize};
use crate::errors::IndexError;
use crate::model::{Document, StoryId};

/// Name for the tokenizer registered with the index
const TOKENIZER_NAME: &str = "story_words";

/// Heap for the single indexing thread; the corpus is tiny
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Tokens longer than this are dropped (scraped URLs, base64 blobs)
const MAX_TOKEN_LEN: usize = 40;

/// Extra weight for query terms found close to each other
const PROXIMITY_BOOST: f32 = 2.0;

/// A searchable story field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedField {
    Title,
    Subtitle,
    Author,
    Content,
}

impl IndexedField {
    /// Search order; metadata-like fields come ahead of content
    pub const ALL: [IndexedField; 4] = [
        IndexedField::Title,
        IndexedField::Subtitle,
        IndexedField::Author,
        IndexedField::Content,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndexedField::Title => "title",
            IndexedField::Subtitle => "subtitle",
            IndexedField::Author => "author",
            IndexedField::Content => "content",
        }
    }
}

/// Per-search knobs
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Maximum hits per field
    pub limit: usize,
    /// Attach stored display fields to each hit
    pub enrich: bool,
}

/// Stored display fields returned with enriched hits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFields {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
}

#[derive(Debug, Clone)]
pub struct FieldHit {
    pub id: StoryId,
    pub score: f32,
    /// Relevance bucket in `0..resolution`, higher is better
    pub level: u32,
    pub stored: Option<StoredFields>,
}

/// Ranked hits for one field
#[derive(Debug, Clone)]
pub struct FieldBatch {
    pub field: IndexedField,
    pub hits: Vec<FieldHit>,
}

#[derive(Debug, Clone, Copy)]
struct SchemaFields {
    id: Field,
    title: Field,
    subtitle: Field,
    author: Field,
    content: Field,
}

impl SchemaFields {
    fn get(&self, field: IndexedField) -> Field {
        match field {
            IndexedField::Title => self.title,
            IndexedField::Subtitle => self.subtitle,
            IndexedField::Author => self.author,
            IndexedField::Content => self.content,
        }
    }
}

/// In-RAM index over the story corpus, built once and read-only afterwards
pub struct StoryIndex {
    reader: IndexReader,
    fields: SchemaFields,
    config: IndexConfig,
    documents: usize,
}

impl std::fmt::Debug for StoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryIndex")
            .field("documents", &self.documents)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Accumulates documents into a fresh index; [`StoryIndexBuilder::finish`]
/// commits and opens the reader
pub struct StoryIndexBuilder {
    writer: IndexWriter,
    index: Index,
    fields: SchemaFields,
    config: IndexConfig,
    documents: usize,
}

impl StoryIndexBuilder {
    pub fn new(config: &IndexConfig) -> Result<Self, IndexError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        index.tokenizers().register(TOKENIZER_NAME, build_tokenizer());
        let writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        Ok(Self {
            writer,
            index,
            fields,
            config: config.clone(),
            documents: 0,
        })
    }

    pub fn add(&mut self, document: &Document) -> Result<(), IndexError> {
        let fields = &self.fields;
        let mut doc = TantivyDocument::default();
        doc.add_u64(fields.id, document.id);
        doc.add_text(fields.title, &document.title);
        if let Some(subtitle) = document.subtitle.as_deref() {
            doc.add_text(fields.subtitle, subtitle);
        }
        doc.add_text(fields.author, &document.author);
        doc.add_text(fields.content, document.content.flattened());
        self.writer.add_document(doc)?;
        self.documents += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<StoryIndex, IndexError> {
        self.writer.commit()?;
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        info!(
            documents = self.documents,
            tokenize = ?self.config.tokenize,
            "built story index"
        );
        Ok(StoryIndex {
            reader,
            fields: self.fields,
            config: self.config,
            documents: self.documents,
        })
    }
}

impl StoryIndex {
    /// Index every document and commit
    pub fn build<'a, I>(documents: I, config: &IndexConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut builder = StoryIndexBuilder::new(config)?;
        for document in documents {
            builder.add(document)?;
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// Search every field separately and return the non-empty batches in
    /// field order
    pub fn search(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Vec<FieldBatch>, IndexError> {
        let terms = query_terms(query);
        if terms.is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let mut batches = Vec::new();
        for field in IndexedField::ALL {
            let field_query = self.field_query(self.fields.get(field), &terms);
            let top_docs = searcher.search(&field_query, &TopDocs::with_limit(options.limit))?;
            if top_docs.is_empty() {
                continue;
            }

            let max_score = top_docs
                .iter()
                .map(|(score, _)| *score)
                .fold(0.0f32, f32::max);
            let mut hits = Vec::with_capacity(top_docs.len());
            for (score, address) in top_docs {
                let doc: TantivyDocument = searcher.doc(address)?;
                let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_u64()) else {
                    continue;
                };
                hits.push(FieldHit {
                    id,
                    score,
                    level: relevance_level(score, max_score, self.config.resolution),
                    stored: options.enrich.then(|| self.stored_fields(&doc)),
                });
            }
            hits.sort_by(|a, b| b.level.cmp(&a.level).then(a.id.cmp(&b.id)));

            debug!(field = field.name(), hits = hits.len(), "field batch");
            batches.push(FieldBatch { field, hits });
        }
        Ok(batches)
    }

    /// All terms must match; close-together terms score higher
    fn field_query(&self, field: Field, terms: &[String]) -> BooleanQuery {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|text| {
                let term = Term::from_field_text(field, text);
                let query: Box<dyn Query> = match self.config.tokenize {
                    Tokenize::Forward => Box::new(FuzzyTermQuery::new_prefix(term, 0, true)),
                    Tokenize::Strict => {
                        Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
                    }
                };
                (Occur::Must, query)
            })
            .collect();

        if terms.len() > 1 && self.config.depth > 0 {
            clauses.push((Occur::Should, self.proximity_query(field, terms.iter())));
            if self.config.bidirectional {
                clauses.push((Occur::Should, self.proximity_query(field, terms.iter().rev())));
            }
        }

        BooleanQuery::new(clauses)
    }

    fn proximity_query<'a>(
        &self,
        field: Field,
        terms: impl Iterator<Item = &'a String>,
    ) -> Box<dyn Query> {
        let terms: Vec<Term> = terms.map(|text| Term::from_field_text(field, text)).collect();
        let mut phrase = PhraseQuery::new(terms);
        phrase.set_slop(self.config.depth);
        Box::new(BoostQuery::new(Box::new(phrase), PROXIMITY_BOOST))
    }

    fn stored_fields(&self, doc: &TantivyDocument) -> StoredFields {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        StoredFields {
            title: text(self.fields.title).unwrap_or_default(),
            subtitle: text(self.fields.subtitle),
            author: text(self.fields.author).unwrap_or_default(),
        }
    }
}

fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = Schema::builder();
    let id = builder.add_u64_field("id", STORED | FAST | INDEXED);
    let title = builder.add_text_field("title", text_options(true));
    let subtitle = builder.add_text_field("subtitle", text_options(true));
    let author = builder.add_text_field("author", text_options(true));
    let content = builder.add_text_field("content", text_options(false));
    (
        builder.build(),
        SchemaFields {
            id,
            title,
            subtitle,
            author,
            content,
        },
    )
}

fn text_options(stored: bool) -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let options = TextOptions::default().set_indexing_options(indexing);
    if stored {
        options.set_stored()
    } else {
        options
    }
}

/// Pipeline: `SimpleTokenizer` → `RemoveLongFilter` → `LowerCaser`.
fn build_tokenizer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
        .filter(LowerCaser)
        .build()
}

/// Tokenize a query the same way indexed text is tokenized
fn query_terms(query: &str) -> Vec<String> {
    let mut analyzer = build_tokenizer();
    let mut stream = analyzer.token_stream(query);
    let mut terms: Vec<String> = Vec::new();
    while stream.advance() {
        let text = &stream.token().text;
        if !terms.contains(text) {
            terms.push(text.clone());
        }
    }
    terms
}

fn relevance_level(score: f32, max_score: f32, resolution: u32) -> u32 {
    if resolution <= 1 || max_score <= 0.0 {
        return 0;
    }
    let top = (resolution - 1) as f32;
    ((score / max_score) * top).round().clamp(0.0, top) as u32
}
