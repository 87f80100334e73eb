// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only in-memory stores built once from the loaded corpus

use std::collections::HashMap;

use crate::model::{Document, StoryId, StoryMetadata};

/// Documents in source order, with an id lookup
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    positions: HashMap<StoryId, usize>,
}

impl DocumentStore {
    /// Build the store. When an id repeats, the first document keeps it.
    pub fn new(documents: Vec<Document>) -> Self {
        let mut positions = HashMap::with_capacity(documents.len());
        for (position, document) in documents.iter().enumerate() {
            positions.entry(document.id).or_insert(position);
        }
        Self {
            documents,
            positions,
        }
    }

    pub fn get(&self, id: StoryId) -> Option<&Document> {
        self.positions.get(&id).map(|&position| &self.documents[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Display metadata keyed by story id
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: HashMap<StoryId, StoryMetadata>,
}

impl MetadataStore {
    pub fn new(records: Vec<StoryMetadata>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            by_id.entry(record.id).or_insert(record);
        }
        Self { records: by_id }
    }

    pub fn get(&self, id: StoryId) -> Option<&StoryMetadata> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: StoryId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoryMetadata> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
