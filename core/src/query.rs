//! Ranked retrieval over a weighted inverted index.

use crate::persist::IndexReader;
use crate::{InvertedIndex, Result};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Anything that can list the `(document id, weight)` pairs of a lemma.
pub trait PostingSource {
    /// `None` when the lemma is not indexed at all.
    fn postings(&self, lemma: &str) -> Result<Option<Vec<(String, f64)>>>;
}

impl PostingSource for InvertedIndex {
    fn postings(&self, lemma: &str) -> Result<Option<Vec<(String, f64)>>> {
        Ok(self.lemmas.get(lemma).map(|docs| docs.iter().map(|(id, w)| (id.clone(), *w)).collect()))
    }
}

impl PostingSource for IndexReader {
    fn postings(&self, lemma: &str) -> Result<Option<Vec<(String, f64)>>> {
        let Some(postings) = IndexReader::postings(self, lemma)? else {
            return Ok(None);
        };
        let mut out = Vec::with_capacity(postings.len());
        for p in postings {
            if let Some(id) = self.document_id(p.doc) {
                out.push((id.to_string(), p.weight));
            }
        }
        Ok(Some(out))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub document_id: String,
    /// One weight per query lemma, in query order; 0.0 where the lemma is absent.
    pub lemma_weights: Vec<f64>,
    pub total_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    /// The lemmas actually looked up: lowercased, first occurrence kept.
    pub lemmas: Vec<String>,
    /// Best first; equal totals ordered by document id.
    pub hits: Vec<QueryHit>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    pub fn document_ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.document_id.as_str()).collect()
    }
}

fn distinct_lowercase(lemmas: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    lemmas
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}

/// Score every document holding at least one of `lemmas` by the sum of its
/// weights for them and rank the results.
pub fn answer_query<S: PostingSource + ?Sized>(source: &S, lemmas: &[String]) -> Result<QueryResult> {
    let lemmas = distinct_lowercase(lemmas);
    let mut per_doc: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (slot, lemma) in lemmas.iter().enumerate() {
        let Some(postings) = source.postings(lemma)? else {
            continue;
        };
        for (doc, weight) in postings {
            per_doc.entry(doc).or_insert_with(|| vec![0.0; lemmas.len()])[slot] = weight;
        }
    }

    let mut hits: Vec<QueryHit> = per_doc
        .into_iter()
        .map(|(document_id, lemma_weights)| {
            let total_weight = lemma_weights.iter().sum();
            QueryHit { document_id, lemma_weights, total_weight }
        })
        .collect();
    hits.sort_by(|a, b| {
        b.total_weight
            .partial_cmp(&a.total_weight)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    tracing::debug!(lemmas = lemmas.len(), hits = hits.len(), "answered query");
    Ok(QueryResult { lemmas, hits })
}
