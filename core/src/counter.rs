use crate::{LemmaCounts, NormalizedToken};

/// Occurrences of each lemma in one document, regardless of tag.
pub fn count_lemmas(tokens: &[NormalizedToken]) -> LemmaCounts {
    let mut counts = LemmaCounts::new();
    for t in tokens {
        *counts.entry(t.lemma.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of normalized tokens a set of counts was built from.
pub fn total(counts: &LemmaCounts) -> usize {
    counts.values().map(|&c| c as usize).sum()
}
