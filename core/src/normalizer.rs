use crate::{NormalizedToken, Resources, Result, TaggedToken};

/// Penn Treebank tags of the open word classes kept for indexing.
pub const OPEN_CLASS_TAGS: &[&str] = &[
    "JJ", "JJR", "JJS", "RB", "RBR", "RBS", "NN", "NNS", "NNP", "NNPS", "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "FW",
];

pub fn is_open_class(tag: &str) -> bool { OPEN_CLASS_TAGS.contains(&tag) }

/// Filter steps, in order: open-class tag, not a stopword (case-sensitive,
/// before lowercasing), no ASCII punctuation, not entirely non-ASCII.
/// Survivors are lowercased. The result is the document's `PoSTags_cleaned`.
pub fn clean(resources: &Resources, tokens: &[TaggedToken]) -> Vec<TaggedToken> {
    let stopwords = resources.stopwords();
    tokens
        .iter()
        .filter(|t| is_open_class(&t.tag))
        .filter(|t| !stopwords.contains(&t.surface))
        .filter(|t| !t.surface.chars().any(|c| c.is_ascii_punctuation()))
        .filter(|t| t.surface.chars().any(|c| c.is_ascii()))
        .map(|t| TaggedToken::new(t.surface.to_lowercase(), t.tag.clone()))
        .collect()
}

/// Lemmatize cleaned tokens by the category of their tag. A tag outside the
/// open classes is an `UnknownPosPrefix` error, never a silent default.
pub fn lemmatize(resources: &Resources, cleaned: &[TaggedToken]) -> Result<Vec<NormalizedToken>> {
    let lemmatizer = resources.lemmatizer();
    cleaned
        .iter()
        .map(|t| {
            Ok(NormalizedToken {
                lemma: lemmatizer.lemmatize_tagged(&t.surface, &t.tag)?,
                tag: t.tag.clone(),
            })
        })
        .collect()
}

pub fn normalize(resources: &Resources, tokens: &[TaggedToken]) -> Result<Vec<NormalizedToken>> {
    lemmatize(resources, &clean(resources, tokens))
}

/// Lemmas of a comma-separated query such as `"markets, new york"`.
/// Each trimmed, lowercased piece is one word, so `new york` stays whole.
/// Pieces are tagged as one sequence and normalized like article text;
/// closed-class words and stopwords drop out.
pub fn normalize_query(resources: &Resources, text: &str) -> Result<Vec<String>> {
    let words: Vec<String> = text
        .split(',')
        .map(|piece| piece.trim().to_lowercase())
        .filter(|piece| !piece.is_empty())
        .collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let tags = resources.tagger().tag(&words);
    let tagged: Vec<TaggedToken> = words.into_iter().zip(tags).map(|(w, t)| TaggedToken::new(w, t)).collect();
    Ok(normalize(resources, &tagged)?.into_iter().map(|t| t.lemma).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::Tagger;
    use crate::resources::Stopwords;
    use crate::lemmatizer::Lemmatizer;
    use crate::Error;

    struct EveryWordIs(&'static str);

    impl Tagger for EveryWordIs {
        fn tag(&self, words: &[String]) -> Vec<String> {
            words.iter().map(|_| self.0.to_string()).collect()
        }
    }

    fn tok(surface: &str, tag: &str) -> TaggedToken { TaggedToken::new(surface, tag) }

    #[test]
    fn closed_classes_are_dropped() {
        let r = Resources::english();
        let out = clean(&r, &[tok("the", "DT"), tok("market", "NN"), tok("of", "IN"), tok("fell", "VBD")]);
        assert_eq!(out, vec![tok("market", "NN"), tok("fell", "VBD")]);
    }

    #[test]
    fn stopwords_match_before_lowercasing() {
        let r = Resources::english();
        // "The" mis-tagged as a noun is not a stopword; it is lowercased after the check
        let out = clean(&r, &[tok("The", "NN"), tok("very", "RB"), tok("Very", "RB")]);
        assert_eq!(out, vec![tok("the", "NN"), tok("very", "RB")]);
    }

    #[test]
    fn punctuation_and_non_ascii_are_dropped() {
        let r = Resources::english();
        let out = clean(
            &r,
            &[tok("U.S.", "NNP"), tok("well-known", "JJ"), tok("北京", "NNP"), tok("Café", "NNP"), tok("'s", "VBZ")],
        );
        assert_eq!(out, vec![tok("café", "NNP")]);
    }

    #[test]
    fn cleaned_is_never_longer_than_tagged() {
        let r = Resources::english();
        let tagged = crate::tokenizer::tag_text(&r, "The markets rallied on Tuesday. Investors, however, remain wary!");
        let cleaned = clean(&r, &tagged);
        assert!(cleaned.len() <= tagged.len());
        assert!(cleaned.iter().all(|t| t.surface == t.surface.to_lowercase()));
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let r = Resources::english();
        let err = lemmatize(&r, &[tok("the", "DT")]).unwrap_err();
        assert!(matches!(err, Error::UnknownPosPrefix { .. }));
    }

    #[test]
    fn normalize_lemmatizes_by_category() {
        let r = Resources::english();
        let out = normalize(&r, &[tok("Markets", "NNS"), tok("rallied", "VBD"), tok("bigger", "JJR")]).unwrap();
        let lemmas: Vec<&str> = out.iter().map(|t| t.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["market", "rally", "big"]);
    }

    #[test]
    fn query_is_split_lowercased_and_normalized() {
        let r = Resources::new(Box::new(EveryWordIs("NNS")), Stopwords::english(), Lemmatizer::english());
        let lemmas = normalize_query(&r, "Markets, the ,  Prices , rallies,").unwrap();
        assert_eq!(lemmas, vec!["market", "price", "rally"]);
    }

    #[test]
    fn query_pieces_keep_inner_spaces() {
        let r = Resources::new(Box::new(EveryWordIs("NNS")), Stopwords::english(), Lemmatizer::english());
        let lemmas = normalize_query(&r, " New York ,markets").unwrap();
        assert_eq!(lemmas, vec!["new york", "market"]);
    }

    #[test]
    fn empty_query_text() {
        let r = Resources::english();
        assert!(normalize_query(&r, " , ,").unwrap().is_empty());
    }
}
