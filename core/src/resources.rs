use crate::config::ResourceSettings;
use crate::lemmatizer::Lemmatizer;
use crate::tagger::{RuleTagger, Tagger};
use crate::Result;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// NLTK's English stopword list. Lowercase only; matching is case-sensitive.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd","your","yours",
    "yourself","yourselves","he","him","his","himself","she","she's","her","hers","herself","it","it's","its","itself",
    "they","them","their","theirs","themselves","what","which","who","whom","this","that","that'll","these","those",
    "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
    "a","an","the","and","but","if","or","because","as","until","while","of","at","by","for","with","about","against",
    "between","into","through","during","before","after","above","below","to","from","up","down","in","out","on","off",
    "over","under","again","further","then","once","here","there","when","where","why","how","all","any","both","each",
    "few","more","most","other","some","such","no","nor","not","only","own","same","so","than","too","very",
    "s","t","can","will","just","don","don't","should","should've","now","d","ll","m","o","re","ve","y",
    "ain","aren","aren't","couldn","couldn't","didn","didn't","doesn","doesn't","hadn","hadn't","hasn","hasn't",
    "haven","haven't","isn","isn't","ma","mightn","mightn't","mustn","mustn't","needn","needn't","shan","shan't",
    "shouldn","shouldn't","wasn","wasn't","weren","weren't","won","won't","wouldn","wouldn't",
];

#[derive(Debug, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Default for Stopwords {
    fn default() -> Self { Self::english() }
}

impl Stopwords {
    pub fn english() -> Self {
        Self { words: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect() }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { words: words.into_iter().map(Into::into).collect() }
    }

    /// One word per line; replaces the built-in list.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, word: &str) -> bool { self.words.contains(word) }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

/// Linguistic resources shared by the tagging and normalization stages.
/// Build one per process and pass it by reference.
pub struct Resources {
    tagger: Box<dyn Tagger>,
    stopwords: Stopwords,
    lemmatizer: Lemmatizer,
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("stopwords", &self.stopwords.len())
            .field("lemmatizer_vocabulary", &self.lemmatizer.has_vocabulary())
            .finish_non_exhaustive()
    }
}

impl Resources {
    pub fn new(tagger: Box<dyn Tagger>, stopwords: Stopwords, lemmatizer: Lemmatizer) -> Self {
        Self { tagger, stopwords, lemmatizer }
    }

    /// Built-in English tagger, stopwords and lemmatizer.
    pub fn english() -> Self {
        Self::new(Box::new(RuleTagger::english()), Stopwords::english(), Lemmatizer::english())
    }

    /// Built-ins extended or replaced by the files named in `settings`.
    pub fn load(settings: &ResourceSettings) -> Result<Self> {
        let mut tagger = RuleTagger::english();
        if let Some(path) = &settings.lexicon {
            let n = tagger.load_lexicon(path)?;
            tracing::info!(path = %path.display(), entries = n, "loaded tagger lexicon");
        }
        let stopwords = match &settings.stopwords {
            Some(path) => {
                let s = Stopwords::load(path)?;
                tracing::info!(path = %path.display(), words = s.len(), "loaded stopwords");
                s
            }
            None => Stopwords::english(),
        };
        let mut lemmatizer = Lemmatizer::english();
        if let Some(path) = &settings.lemma_exceptions {
            let n = lemmatizer.load_exceptions(path)?;
            tracing::info!(path = %path.display(), entries = n, "loaded lemma exceptions");
        }
        if let Some(path) = &settings.vocabulary {
            let n = lemmatizer.load_vocabulary(path)?;
            tracing::info!(path = %path.display(), lemmas = n, "loaded lemma vocabulary");
        }
        Ok(Self::new(Box::new(tagger), stopwords, lemmatizer))
    }

    pub fn tagger(&self) -> &dyn Tagger { self.tagger.as_ref() }

    pub fn stopwords(&self) -> &Stopwords { &self.stopwords }

    pub fn lemmatizer(&self) -> &Lemmatizer { &self.lemmatizer }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_are_case_sensitive() {
        let s = Stopwords::english();
        assert!(s.contains("the"));
        assert!(!s.contains("The"));
        assert_eq!(s.len(), 179);
    }

    #[test]
    fn load_replaces_builtin_stopwords() {
        let dir = tempfile::tempdir().unwrap();
        let stop = dir.path().join("stop.txt");
        std::fs::write(&stop, "said\n\n# comment\nreuters\n").unwrap();
        let settings = ResourceSettings { stopwords: Some(stop), ..Default::default() };
        let r = Resources::load(&settings).unwrap();
        assert!(r.stopwords().contains("reuters"));
        assert!(!r.stopwords().contains("the"));
        assert_eq!(r.stopwords().len(), 2);
    }

    #[test]
    fn missing_resource_file_fails() {
        let settings = ResourceSettings { lexicon: Some("/nope/lexicon.tsv".into()), ..Default::default() };
        assert!(Resources::load(&settings).is_err());
    }
}
