use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod config;
pub mod corpus;
pub mod counter;
pub mod error;
pub mod index;
pub mod lemmatizer;
pub mod normalizer;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod resources;
pub mod store;
pub mod tagger;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::InvertedIndex;
pub use resources::Resources;

/// Position of a document in the sorted document table of a built index.
pub type DocOrd = u32;

/// Lemma -> number of occurrences within one document.
pub type LemmaCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub surface: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { surface: surface.into(), tag: tag.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedToken {
    pub lemma: String,
    pub tag: String,
}

/// One crawled article and the fields each pipeline stage derives from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Article URL; unique across the corpus and stable between runs.
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub raw_text: String,
    /// PoSTags
    pub tagged: Option<Vec<TaggedToken>>,
    /// PoSTags_cleaned: lowercased survivors of filtering, before lemmatization.
    pub cleaned: Option<Vec<TaggedToken>>,
    pub lemma_counts: Option<LemmaCounts>,
}

impl Document {
    pub fn new(id: impl Into<String>, source: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            title: None,
            raw_text: raw_text.into(),
            tagged: None,
            cleaned: None,
            lemma_counts: None,
        }
    }
}

/// All documents of a build, in source order then input order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self { Self { documents } }

    pub fn document_count(&self) -> usize { self.documents.len() }

    /// Source names in first-seen order.
    pub fn sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for doc in &self.documents {
            if !out.iter().any(|s| s == &doc.source) {
                out.push(doc.source.clone());
            }
        }
        out
    }
}
