use crate::counter::total;
use crate::{Corpus, Document, Error, LemmaCounts, Result, TaggedToken};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Lemma -> document id -> TF-IDF weight. Ordered maps throughout so that
/// traversal, and therefore serialization, is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub document_count: u32,
    /// Every document id of the corpus, sorted ascending.
    pub documents: Vec<String>,
    pub lemmas: BTreeMap<String, BTreeMap<String, f64>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Add one weighted posting, registering the document if it is new.
    pub fn insert(&mut self, lemma: &str, document: &str, weight: f64) {
        if let Err(pos) = self.documents.binary_search_by(|d| d.as_str().cmp(document)) {
            self.documents.insert(pos, document.to_string());
            self.document_count = self.documents.len() as u32;
        }
        self.lemmas
            .entry(lemma.to_string())
            .or_default()
            .insert(document.to_string(), weight);
    }

    pub fn weight(&self, lemma: &str, document: &str) -> Option<f64> {
        self.lemmas.get(lemma)?.get(document).copied()
    }

    pub fn num_lemmas(&self) -> usize { self.lemmas.len() }

    pub fn num_postings(&self) -> usize { self.lemmas.values().map(BTreeMap::len).sum() }
}

/// `ln(N / (1 + df))`, floored at zero so weights stay non-negative when a
/// lemma occurs in every document.
pub fn idf(document_count: usize, docs_containing: usize) -> f64 {
    (document_count as f64 / (1 + docs_containing) as f64).ln().max(0.0)
}

fn counts_of<'a>(doc: &'a Document) -> Result<(&'a LemmaCounts, &'a [TaggedToken])> {
    let counts = doc.lemma_counts.as_ref().ok_or_else(|| Error::MissingField {
        stage: "weight",
        document: doc.id.clone(),
        field: "lemma_counts",
    })?;
    let cleaned = doc.cleaned.as_ref().ok_or_else(|| Error::MissingField {
        stage: "weight",
        document: doc.id.clone(),
        field: "cleaned",
    })?;
    Ok((counts, cleaned))
}

/// Number of documents, across every source, whose counts contain each lemma.
pub fn document_frequencies(corpus: &Corpus) -> Result<BTreeMap<String, u32>> {
    let mut df: BTreeMap<String, u32> = BTreeMap::new();
    for doc in &corpus.documents {
        let (counts, _) = counts_of(doc)?;
        for (lemma, &count) in counts {
            if count > 0 {
                *df.entry(lemma.clone()).or_insert(0) += 1;
            }
        }
    }
    Ok(df)
}

/// Weight every (lemma, document) pair of the corpus:
/// `count / normalized_tokens * ln(N / (1 + df))`.
///
/// Documents without normalized tokens add nothing but still count toward N.
/// Fails if a document has not been through the count stage, if its counts
/// disagree with its cleaned tokens, or if two documents share an id.
pub fn build_index(corpus: &Corpus) -> Result<InvertedIndex> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(corpus.document_count());
    for doc in &corpus.documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(Error::DuplicateDocument(doc.id.clone()));
        }
        let (counts, cleaned) = counts_of(doc)?;
        let counted = total(counts);
        if counted != cleaned.len() {
            return Err(Error::CountMismatch { document: doc.id.clone(), counted, tokens: cleaned.len() });
        }
    }

    let n = corpus.document_count();
    let df = document_frequencies(corpus)?;

    let mut documents: Vec<String> = corpus.documents.iter().map(|d| d.id.clone()).collect();
    documents.sort();
    let mut index = InvertedIndex { document_count: n as u32, documents, lemmas: BTreeMap::new() };

    let mut skipped = 0usize;
    for doc in &corpus.documents {
        let (counts, cleaned) = counts_of(doc)?;
        if cleaned.is_empty() {
            skipped += 1;
            continue;
        }
        let len = cleaned.len() as f64;
        for (lemma, &count) in counts {
            if count == 0 {
                continue;
            }
            let tf = count as f64 / len;
            let weight = tf * idf(n, df[lemma] as usize);
            index.lemmas.entry(lemma.clone()).or_default().insert(doc.id.clone(), weight);
        }
    }

    tracing::info!(
        num_docs = n,
        num_lemmas = index.num_lemmas(),
        num_postings = index.num_postings(),
        empty_docs = skipped,
        "computed tf-idf weights"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, counts: &[(&str, u32)], tokens: usize) -> Document {
        let mut d = Document::new(id, "test", "");
        d.cleaned = Some(vec![TaggedToken::new("x", "NN"); tokens]);
        d.lemma_counts = Some(counts.iter().map(|(l, c)| (l.to_string(), *c)).collect());
        d
    }

    #[test]
    fn zero_idf_when_lemma_in_all_but_one_document() {
        let corpus = Corpus::new(vec![
            doc("A", &[("economy", 2), ("other", 8)], 10),
            doc("B", &[("economy", 1), ("other", 4)], 5),
            doc("C", &[("other", 3)], 3),
        ]);
        let index = build_index(&corpus).unwrap();
        assert_eq!(index.weight("economy", "A"), Some(0.0));
        assert_eq!(index.weight("economy", "B"), Some(0.0));
        assert_eq!(index.weight("economy", "C"), None);
    }

    #[test]
    fn weight_is_tf_times_idf() {
        let corpus = Corpus::new(vec![
            doc("a", &[("flood", 1), ("rain", 3)], 4),
            doc("b", &[("rain", 2)], 2),
            doc("c", &[("sun", 1)], 1),
            doc("d", &[("sun", 1)], 1),
        ]);
        let index = build_index(&corpus).unwrap();
        let expected = 0.25 * (4.0f64 / 2.0).ln();
        assert_eq!(index.weight("flood", "a"), Some(expected));
        let rain_a = 0.75 * (4.0f64 / 3.0).ln();
        assert_eq!(index.weight("rain", "a"), Some(rain_a));
        assert_eq!(index.num_lemmas(), 3);
        assert_eq!(index.num_postings(), 5);
    }

    #[test]
    fn lemma_in_every_document_weighs_zero() {
        let corpus = Corpus::new(vec![doc("a", &[("said", 1)], 1), doc("b", &[("said", 2)], 2)]);
        let index = build_index(&corpus).unwrap();
        assert_eq!(index.weight("said", "a"), Some(0.0));
        assert!(index.lemmas.values().flat_map(|d| d.values()).all(|w| *w >= 0.0));
    }

    #[test]
    fn empty_document_contributes_nothing_but_counts() {
        let corpus = Corpus::new(vec![doc("a", &[("flood", 1)], 1), doc("empty", &[], 0), doc("c", &[("sun", 1)], 1)]);
        let index = build_index(&corpus).unwrap();
        assert_eq!(index.document_count, 3);
        assert!(index.lemmas.values().all(|docs| !docs.contains_key("empty")));
        assert_eq!(index.weight("flood", "a"), Some((3.0f64 / 2.0).ln()));
    }

    #[test]
    fn document_frequency_bounds() {
        let corpus = Corpus::new(vec![
            doc("a", &[("x", 1), ("y", 1)], 2),
            doc("b", &[("y", 2)], 2),
            doc("c", &[("z", 1)], 1),
        ]);
        let df = document_frequencies(&corpus).unwrap();
        for (_, &n) in &df {
            assert!(n >= 1 && n as usize <= corpus.document_count());
        }
        assert_eq!(df["y"], 2);
    }

    #[test]
    fn rebuild_is_bitwise_identical() {
        let corpus = Corpus::new(vec![
            doc("a", &[("flood", 3), ("rain", 7)], 10),
            doc("b", &[("rain", 1), ("wind", 2)], 3),
            doc("c", &[("wind", 1)], 1),
        ]);
        let first = build_index(&corpus).unwrap();
        let second = build_index(&corpus).unwrap();
        for (lemma, docs) in &first.lemmas {
            for (id, w) in docs {
                assert_eq!(w.to_bits(), second.weight(lemma, id).unwrap().to_bits());
            }
        }
    }

    #[test]
    fn count_mismatch_is_fatal() {
        let corpus = Corpus::new(vec![doc("a", &[("flood", 2)], 3)]);
        assert!(matches!(build_index(&corpus), Err(Error::CountMismatch { .. })));
    }

    #[test]
    fn missing_counts_is_fatal() {
        let corpus = Corpus::new(vec![Document::new("a", "test", "text")]);
        assert!(matches!(build_index(&corpus), Err(Error::MissingField { field: "lemma_counts", .. })));
    }

    #[test]
    fn duplicate_ids_are_fatal() {
        let corpus = Corpus::new(vec![doc("a", &[("x", 1)], 1), doc("a", &[("y", 1)], 1)]);
        assert!(matches!(build_index(&corpus), Err(Error::DuplicateDocument(id)) if id == "a"));
    }
}
