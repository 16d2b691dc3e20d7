use crate::{Resources, TaggedToken};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).expect("valid regex");
    static ref WORD: Regex = Regex::new(
        r"(?x)
        (?:\p{L}\.){2,}                              # dotted abbreviations: U.S.
        | \d+(?:[.,:]\d+)*\p{L}*                     # numbers: 3.5  1,000  10:30  1990s
        | [\p{L}\p{N}_]+(?:[-'’][\p{L}\p{N}_]+)*     # words, with inner hyphens and apostrophes
        | \.\.\.
        | --
        | [^\s\p{L}\p{N}_]                           # any other symbol on its own
        "
    )
    .expect("valid regex");
    static ref ABBREVIATIONS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "mr","mrs","ms","dr","prof","sr","jr","st","gen","gov","sen","rep","lt","col","sgt","capt","rev",
            "inc","ltd","co","corp","dept","univ","vs","etc","no","vol","fig","approx","est",
            "jan","feb","mar","apr","jun","jul","aug","sep","sept","oct","nov","dec",
            "u.s","u.k","u.n","e.g","i.e","a.m","p.m",
        ];
        words.iter().copied().collect()
    };
}

const CLITICS: &[&str] = &["'s", "'re", "'ve", "'ll", "'d", "'m"];

fn opens_sentence(rest: &str) -> bool {
    match rest.chars().next() {
        Some(c) => c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '“' | '‘' | '(' | '['),
        None => true,
    }
}

fn ends_with_abbreviation(head: &str, terminator: &str) -> bool {
    if !terminator.starts_with('.') {
        return false;
    }
    let last = head
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if last.is_empty() {
        return false;
    }
    // initials: "J. Smith"
    if last.chars().count() == 1 && last.chars().all(char::is_alphabetic) {
        return true;
    }
    ABBREVIATIONS.contains(last.as_str())
}

/// Split text into sentences on terminal punctuation that is followed by
/// whitespace and something that can start a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        if !opens_sentence(&text[m.end()..]) {
            continue;
        }
        if ends_with_abbreviation(&text[start..m.start()], m.as_str()) {
            continue;
        }
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            out.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn push_with_clitics(word: &str, out: &mut Vec<String>) {
    let lower = word.to_lowercase().replace('’', "'");
    if lower.ends_with("n't") {
        // the last three chars of `word` are the clitic, whatever its apostrophe's width
        if let Some((cut, _)) = word.char_indices().rev().nth(2) {
            if cut > 0 {
                out.push(word[..cut].to_string());
                out.push(word[cut..].to_string());
                return;
            }
        }
    }
    if let Some(pos) = word.rfind(['\'', '’']) {
        let clitic = lower[lower.rfind('\'').unwrap_or(0)..].to_string();
        if pos > 0 && CLITICS.contains(&clitic.as_str()) {
            out.push(word[..pos].to_string());
            out.push(word[pos..].to_string());
            return;
        }
    }
    out.push(word.to_string());
}

/// Treebank-style word segmentation of a single sentence.
pub fn tokenize_words(sentence: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in WORD.find_iter(sentence) {
        push_with_clitics(m.as_str(), &mut out);
    }
    out
}

/// Words of a whole text, sentence by sentence, in input order.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfc().collect::<String>();
    split_sentences(&normalized)
        .into_iter()
        .flat_map(tokenize_words)
        .collect()
}

/// Segment `text` into sentences, then words, and tag each sentence with the
/// resource tagger. Sentence boundaries are not kept in the output.
pub fn tag_text(resources: &Resources, text: &str) -> Vec<TaggedToken> {
    let normalized = text.nfc().collect::<String>();
    let mut tagged = Vec::new();
    for sentence in split_sentences(&normalized) {
        let words = tokenize_words(sentence);
        if words.is_empty() {
            continue;
        }
        let tags = resources.tagger().tag(&words);
        debug_assert_eq!(tags.len(), words.len(), "tagger must return one tag per word");
        tagged.extend(words.into_iter().zip(tags).map(|(w, t)| TaggedToken::new(w, t)));
    }
    tagged
}
