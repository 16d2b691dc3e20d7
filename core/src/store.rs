//! Structured record store for the separable pipeline stages.
//!
//! Each source gets its own sled tree, `articles/<source>`, keyed by the
//! big-endian position of the document within that source so iteration
//! follows input order. Values are bincode-encoded [`Document`]s. The
//! `lemmas` tree maps each lemma to its `(document id, weight)` list. Every
//! write replaces whole trees; nothing is appended.

use crate::{Corpus, Document, Error, InvertedIndex, Result};
use std::path::Path;

const ARTICLE_PREFIX: &str = "articles/";
const LEMMA_TREE: &str = "lemmas";
const META_TREE: &str = "meta";
const SOURCES_KEY: &[u8] = b"sources";

pub struct RecordStore {
    db: sled::Db,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// In-memory store that is discarded on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn article_tree(source: &str) -> String { format!("{ARTICLE_PREFIX}{source}") }

    /// Sources in the order they were last written.
    pub fn sources(&self) -> Result<Vec<String>> {
        let meta = self.db.open_tree(META_TREE)?;
        match meta.get(SOURCES_KEY)? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace every stored document with those of `corpus`.
    pub fn replace_documents(&self, corpus: &Corpus) -> Result<()> {
        let sources = corpus.sources();
        for name in self.db.tree_names() {
            let name = String::from_utf8_lossy(&name).into_owned();
            if let Some(source) = name.strip_prefix(ARTICLE_PREFIX) {
                if !sources.iter().any(|s| s == source) {
                    self.db.drop_tree(name.as_bytes())?;
                }
            }
        }
        for source in &sources {
            let tree_name = Self::article_tree(source);
            self.db.drop_tree(tree_name.as_bytes())?;
            let tree = self.db.open_tree(tree_name.as_bytes())?;
            let docs = corpus.documents.iter().filter(|d| &d.source == source);
            for (pos, doc) in docs.enumerate() {
                tree.insert((pos as u32).to_be_bytes(), bincode::serialize(doc)?)?;
            }
            tracing::debug!(source = %source, records = tree.len(), "replaced source records");
        }
        let meta = self.db.open_tree(META_TREE)?;
        meta.insert(SOURCES_KEY, bincode::serialize(&sources)?)?;
        self.db.flush()?;
        Ok(())
    }

    /// All stored documents, source by source, in input order.
    pub fn load_corpus(&self) -> Result<Corpus> {
        let mut documents = Vec::new();
        for source in self.sources()? {
            let tree = self.db.open_tree(Self::article_tree(&source).as_bytes())?;
            for item in tree.iter() {
                let (_, value) = item?;
                let doc: Document = bincode::deserialize(&value)?;
                if doc.source != source {
                    return Err(Error::CorruptRecord(format!(
                        "record {} is stored under source {source} but belongs to {}",
                        doc.id, doc.source
                    )));
                }
                documents.push(doc);
            }
        }
        Ok(Corpus::new(documents))
    }

    /// Number of document records across all stored sources.
    pub fn document_count(&self) -> Result<usize> {
        let mut n = 0;
        for source in self.sources()? {
            n += self.db.open_tree(Self::article_tree(&source).as_bytes())?.len();
        }
        Ok(n)
    }

    /// Replace the lemma table with the weights of `index`.
    pub fn replace_lemmas(&self, index: &InvertedIndex) -> Result<()> {
        self.db.drop_tree(LEMMA_TREE)?;
        let tree = self.db.open_tree(LEMMA_TREE)?;
        for (lemma, docs) in &index.lemmas {
            let weights: Vec<(&str, f64)> = docs.iter().map(|(id, w)| (id.as_str(), *w)).collect();
            tree.insert(lemma.as_bytes(), bincode::serialize(&weights)?)?;
        }
        self.db.flush()?;
        Ok(())
    }

    pub fn lemma_weights(&self, lemma: &str) -> Result<Option<Vec<(String, f64)>>> {
        let tree = self.db.open_tree(LEMMA_TREE)?;
        match tree.get(lemma.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn lemma_count(&self) -> Result<usize> {
        Ok(self.db.open_tree(LEMMA_TREE)?.len())
    }
}
