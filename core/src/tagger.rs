//! Part-of-speech tagging with Penn Treebank tags.
//!
//! [`RuleTagger`] is a lexicon-plus-morphology tagger with a pass of
//! contextual repair rules. Closed-class words and frequent irregular forms
//! come from the lexicon. Everything else is guessed from its shape and
//! suffix, then neighbouring tags fix the usual confusions (`to report` is a
//! verb, `the report` is a noun).

use crate::{Error, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Assigns one tag to every word of a sentence.
pub trait Tagger {
    fn tag(&self, words: &[String]) -> Vec<String>;
}

lazy_static! {
    static ref BUILTIN_LEXICON: Vec<(&'static str, &'static str)> = {
        let groups: &[(&str, &[&str])] = &[
            ("DT", &["the","a","an","this","these","those","every","each","some","any","no","another","all","both","either","neither","that"]),
            ("IN", &["of","in","on","at","by","for","with","from","about","into","over","after","before","under","between",
                     "through","during","without","within","against","among","across","since","until","upon","toward",
                     "towards","behind","beyond","despite","near","above","below","around","amid","per","via","than",
                     "whether","because","although","though","while","if","unless","as","like","onto","throughout","off"]),
            ("CC", &["and","or","but","nor","plus"]),
            ("PRP", &["i","you","he","she","it","we","they","me","him","us","them","myself","yourself","himself","herself",
                      "itself","ourselves","themselves"]),
            ("PRP$", &["my","your","his","her","its","our","their"]),
            ("WDT", &["which","whatever"]),
            ("WP", &["who","whom","what"]),
            ("WP$", &["whose"]),
            ("WRB", &["when","where","why","how"]),
            ("MD", &["can","could","may","might","must","shall","should","will","would","'ll","ca"]),
            ("TO", &["to"]),
            ("EX", &["there"]),
            ("POS", &["'s","'"]),
            ("VB", &["be"]),
            ("VBZ", &["is","has","does","says","goes","seems","remains"]),
            ("VBP", &["are","am","have","do","'re","'ve","'m","say"]),
            ("VBD", &["was","were","had","did","said","told","went","got","took","came","gave","found","made","saw",
                      "knew","thought","became","began","left","held","brought","wrote","stood","heard","felt","kept",
                      "met","ran","paid","sent","fell","rose","led","won","lost","spoke","chose","drove","grew","hit"]),
            ("VBN", &["been","done","gone","given","taken","known","seen","shown","written","spoken","chosen","grown",
                      "driven","fallen","risen","stolen","begun","broken","eaten","forgotten","hidden"]),
            ("VBG", &["being","having","doing","going"]),
            ("RB", &["not","n't","also","very","just","now","then","only","even","still","never","always","often","here",
                     "however","too","already","yet","again","ago","soon","almost","ever","perhaps","rather","quite",
                     "later","so","well","back","away","instead","together","once","twice","else","indeed","thus"]),
            ("RBR", &["less"]),
            ("RBS", &["least"]),
            ("JJR", &["more","better","worse","greater","larger","higher","lower","bigger","smaller","older","younger"]),
            ("JJS", &["most","best","worst","biggest","largest","highest","lowest","greatest"]),
            ("JJ", &["new","good","old","great","big","high","small","large","long","last","first","other","many","much",
                     "few","own","public","next","early","late","young","little","same","different","important","major",
                     "local","national","international","foreign","real","recent","several","such","former","free",
                     "full","main","whole","true","clear","hard","strong","possible","likely","able","second","third"]),
            ("NNS", &["people","children","men","women","police","data","media","feet","teeth","mice"]),
            ("CD", &["one","two","three","four","five","six","seven","eight","nine","ten","eleven","twelve","twenty",
                     "thirty","hundred","thousand","million","billion","trillion","dozen"]),
            (".", &[".","!","?"]),
            (",", &[","]),
            (":", &[":",";","--","...","-"]),
            ("(", &["(","[","{"]),
            (")", &[")","]","}"]),
            ("``", &["“","‘","``"]),
            ("''", &["\"","”","’","''"]),
            ("$", &["$","£","€"]),
            ("#", &["#"]),
        ];
        groups
            .iter()
            .flat_map(|(tag, words)| words.iter().map(move |w| (*w, *tag)))
            .collect()
    };
}

const NOUN_SUFFIXES: &[&str] = &[
    "ness", "ment", "tion", "sion", "ity", "ance", "ence", "ship", "ism", "ist", "er", "or", "age", "ery", "dom", "hood",
];
const ADJ_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ical", "al", "ic", "less", "ish", "ary"];
const VERB_SUFFIXES: &[&str] = &["ize", "ise", "ify", "ate"];

const BE_FORMS: &[&str] = &["be", "is", "are", "am", "was", "were", "been", "being", "'re", "'m"];
const HAVE_FORMS: &[&str] = &["have", "has", "had", "having", "'ve"];

/// Lexicon and suffix based tagger with contextual repair rules.
#[derive(Debug, Clone)]
pub struct RuleTagger {
    lexicon: HashMap<String, String>,
}

impl Default for RuleTagger {
    fn default() -> Self { Self::english() }
}

impl RuleTagger {
    /// Tagger backed by the built-in English lexicon.
    pub fn english() -> Self {
        let lexicon = BUILTIN_LEXICON
            .iter()
            .map(|(w, t)| (w.to_string(), t.to_string()))
            .collect();
        Self { lexicon }
    }

    /// Add or override lexicon entries.
    pub fn extend<I, W, T>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (W, T)>,
        W: Into<String>,
        T: Into<String>,
    {
        for (w, t) in entries {
            self.lexicon.insert(w.into(), t.into());
        }
    }

    /// Load `word<TAB>TAG` lines on top of the current lexicon. Blank lines and
    /// `#` comments are ignored.
    pub fn load_lexicon<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut loaded = 0;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (word, tag) = line.split_once('\t').ok_or_else(|| {
                Error::Config(format!("{}:{}: expected word<TAB>TAG", path.display(), lineno + 1))
            })?;
            self.lexicon.insert(word.to_string(), tag.trim().to_string());
            loaded += 1;
        }
        Ok(loaded)
    }

    fn lookup(&self, word: &str) -> Option<&str> {
        self.lexicon
            .get(word)
            .or_else(|| self.lexicon.get(&word.to_lowercase()))
            .map(String::as_str)
    }

    fn guess(&self, word: &str, sentence_initial: bool) -> &'static str {
        let first = match word.chars().next() {
            Some(c) => c,
            None => return "SYM",
        };
        if !word.chars().any(char::is_alphanumeric) {
            return "SYM";
        }
        if first.is_ascii_digit() {
            return "CD";
        }
        let lower = word.to_lowercase();
        let by_suffix = suffix_tag(&lower);
        if first.is_uppercase() {
            let all_caps = word.chars().count() > 1 && word.chars().all(|c| !c.is_lowercase());
            if all_caps || !sentence_initial || by_suffix.is_none() {
                return "NNP";
            }
        }
        if lower.contains('-') {
            return "JJ";
        }
        by_suffix.unwrap_or("NN")
    }

    fn repair(&self, words: &[String], tags: &mut [String]) {
        for i in 0..tags.len() {
            let lower = words[i].to_lowercase();
            let prev_tag = if i > 0 { tags[i - 1].clone() } else { String::new() };
            let prev_word = if i > 0 { words[i - 1].to_lowercase() } else { String::new() };
            let next_tag = tags.get(i + 1).cloned().unwrap_or_default();

            let unknown = self.lookup(&lower).is_none();
            let subject = matches!(prev_word.as_str(), "i" | "you" | "we" | "they");
            let third_person = matches!(prev_word.as_str(), "he" | "she" | "it");

            let repaired = match (prev_tag.as_str(), tags[i].as_str()) {
                ("TO" | "MD", "VBP") => Some("VB"),
                ("TO" | "MD", "NN" | "JJ" | "VBD") if unknown => Some("VB"),
                ("DT" | "PRP$" | "JJ" | "POS", "VB" | "VBP") => Some("NN"),
                (_, "VBD") if BE_FORMS.contains(&prev_word.as_str()) || HAVE_FORMS.contains(&prev_word.as_str()) => {
                    Some("VBN")
                }
                ("PRP" | "WP" | "EX", "POS") if lower == "'s" => Some("VBZ"),
                ("PRP", "NNS") if third_person => Some("VBZ"),
                ("PRP", "NN" | "VB") if subject && unknown => Some("VBP"),
                ("PRP", _) if lower == "'d" => Some("MD"),
                _ => None,
            };
            if let Some(tag) = repaired {
                tags[i] = tag.to_string();
            }
            // "that" introducing a clause
            if lower == "that" && tags[i] == "DT" && matches!(next_tag.as_str(), "DT" | "PRP" | "NNP" | "EX") {
                tags[i] = "IN".to_string();
            }
        }
    }
}

fn suffix_tag(lower: &str) -> Option<&'static str> {
    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ing") {
        return Some("VBG");
    }
    if len > 3 && lower.ends_with("ed") {
        return Some("VBD");
    }
    if len > 3 && lower.ends_with("ly") {
        return Some("RB");
    }
    if len > 4 && lower.ends_with("est") {
        return Some("JJS");
    }
    if len > 3 && lower.ends_with('s') && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        let stem = &lower[..lower.len() - 1];
        if ADJ_SUFFIXES.iter().any(|s| stem.ends_with(s)) && !stem.ends_with("al") {
            return Some("JJ");
        }
        return Some("NNS");
    }
    if NOUN_SUFFIXES.iter().any(|s| len > s.len() + 2 && lower.ends_with(s)) {
        return Some("NN");
    }
    if ADJ_SUFFIXES.iter().any(|s| len > s.len() + 2 && lower.ends_with(s)) {
        return Some("JJ");
    }
    if VERB_SUFFIXES.iter().any(|s| len > s.len() + 2 && lower.ends_with(s)) {
        return Some("VB");
    }
    None
}

impl Tagger for RuleTagger {
    fn tag(&self, words: &[String]) -> Vec<String> {
        let mut tags: Vec<String> = words
            .iter()
            .enumerate()
            .map(|(i, w)| match self.lookup(w) {
                Some(t) => t.to_string(),
                None => self.guess(w, i == 0).to_string(),
            })
            .collect();
        self.repair(words, &mut tags);
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(sentence: &str) -> Vec<(String, String)> {
        let words: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
        let tags = RuleTagger::english().tag(&words);
        words.into_iter().zip(tags).collect()
    }

    fn tag_of<'a>(tagged: &'a [(String, String)], word: &str) -> &'a str {
        &tagged.iter().find(|(w, _)| w == word).unwrap().1
    }

    #[test]
    fn closed_classes_come_from_the_lexicon() {
        let t = tag("The minister and her staff spoke with them");
        assert_eq!(tag_of(&t, "The"), "DT");
        assert_eq!(tag_of(&t, "and"), "CC");
        assert_eq!(tag_of(&t, "her"), "PRP$");
        assert_eq!(tag_of(&t, "with"), "IN");
        assert_eq!(tag_of(&t, "them"), "PRP");
        assert_eq!(tag_of(&t, "minister"), "NN");
    }

    #[test]
    fn suffixes_guess_open_classes() {
        let t = tag("Officials quickly announced dangerous flooding across Europe");
        assert_eq!(tag_of(&t, "quickly"), "RB");
        assert_eq!(tag_of(&t, "announced"), "VBD");
        assert_eq!(tag_of(&t, "dangerous"), "JJ");
        assert_eq!(tag_of(&t, "flooding"), "VBG");
        assert_eq!(tag_of(&t, "Europe"), "NNP");
        assert_eq!(tag_of(&t, "Officials"), "NNS");
    }

    #[test]
    fn context_repairs_verbs_after_to_and_modals() {
        let t = tag("They want to report and we will publish the report");
        assert_eq!(t[3].1, "VB");
        assert_eq!(tag_of(&t, "publish"), "VB");
        assert_eq!(t[9].1, "NN");
    }

    #[test]
    fn participles_after_auxiliaries() {
        let t = tag("prices have jumped");
        assert_eq!(tag_of(&t, "jumped"), "VBN");
    }

    #[test]
    fn numbers_and_punctuation() {
        let t = tag("In 2020 , 3.5 million voted .");
        assert_eq!(tag_of(&t, "2020"), "CD");
        assert_eq!(tag_of(&t, ","), ",");
        assert_eq!(tag_of(&t, "million"), "CD");
        assert_eq!(tag_of(&t, "."), ".");
    }

    #[test]
    fn lexicon_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.tsv");
        std::fs::write(&path, "# extra words\nbrexit\tNNP\nreport\tVB\n").unwrap();
        let mut tagger = RuleTagger::english();
        assert_eq!(tagger.load_lexicon(&path).unwrap(), 2);
        let tags = tagger.tag(&["brexit".to_string()]);
        assert_eq!(tags, vec!["NNP"]);
    }

    #[test]
    fn malformed_lexicon_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.tsv");
        std::fs::write(&path, "no-tab-here\n").unwrap();
        assert!(matches!(RuleTagger::english().load_lexicon(&path), Err(Error::Config(_))));
    }
}
