//! Lemmatization by part-of-speech category.
//!
//! Irregular forms are looked up in an exception table first. With a
//! vocabulary of known lemmas loaded, the regular detachment rules generate
//! candidates and the shortest known candidate wins; an unknown word is
//! returned unchanged. Without a vocabulary, orthographic heuristics pick the
//! candidate, guided by the fine-grained tag when one is available.

use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl Category {
    /// Category of a Penn Treebank tag, by its two-character prefix.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let prefix: String = tag.chars().take(2).collect();
        match prefix.as_str() {
            "NN" | "FW" => Ok(Category::Noun),
            "JJ" => Ok(Category::Adjective),
            "VB" => Ok(Category::Verb),
            "RB" => Ok(Category::Adverb),
            _ => Err(Error::UnknownPosPrefix { tag: tag.to_string(), prefix }),
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "n" | "noun" => Some(Category::Noun),
            "v" | "verb" => Some(Category::Verb),
            "a" | "s" | "adj" | "adjective" => Some(Category::Adjective),
            "r" | "adv" | "adverb" => Some(Category::Adverb),
            _ => None,
        }
    }

    fn rules(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Category::Noun => &[
                ("s", ""), ("ses", "s"), ("ves", "f"), ("xes", "x"), ("zes", "z"),
                ("ches", "ch"), ("shes", "sh"), ("men", "man"), ("ies", "y"),
            ],
            Category::Verb => &[
                ("s", ""), ("ies", "y"), ("es", "e"), ("es", ""),
                ("ed", "e"), ("ed", ""), ("ing", "e"), ("ing", ""),
            ],
            Category::Adjective => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
            Category::Adverb => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Noun => "noun",
            Category::Verb => "verb",
            Category::Adjective => "adjective",
            Category::Adverb => "adverb",
        };
        f.write_str(name)
    }
}

const BUILTIN_EXCEPTIONS: &[(Category, &[(&str, &str)])] = &[
    (Category::Noun, &[
        ("children", "child"), ("men", "man"), ("women", "woman"), ("feet", "foot"), ("teeth", "tooth"),
        ("mice", "mouse"), ("geese", "goose"), ("lives", "life"), ("wives", "wife"), ("knives", "knife"),
        ("wolves", "wolf"), ("leaves", "leaf"), ("halves", "half"), ("shelves", "shelf"), ("thieves", "thief"),
        ("analyses", "analysis"), ("crises", "crisis"), ("theses", "thesis"), ("criteria", "criterion"),
        ("phenomena", "phenomenon"), ("data", "datum"), ("media", "medium"), ("news", "news"),
        ("series", "series"), ("species", "species"), ("means", "means"), ("politics", "politics"),
        ("economics", "economics"), ("physics", "physics"), ("people", "people"), ("police", "police"),
    ]),
    (Category::Verb, &[
        ("is", "be"), ("are", "be"), ("am", "be"), ("was", "be"), ("were", "be"), ("been", "be"), ("being", "be"),
        ("has", "have"), ("had", "have"), ("having", "have"), ("does", "do"), ("did", "do"), ("done", "do"),
        ("goes", "go"), ("went", "go"), ("gone", "go"), ("said", "say"), ("says", "say"), ("made", "make"),
        ("told", "tell"), ("got", "get"), ("gotten", "get"), ("took", "take"), ("taken", "take"),
        ("came", "come"), ("gave", "give"), ("given", "give"), ("found", "find"), ("saw", "see"), ("seen", "see"),
        ("knew", "know"), ("known", "know"), ("thought", "think"), ("became", "become"), ("began", "begin"),
        ("begun", "begin"), ("left", "leave"), ("held", "hold"), ("brought", "bring"), ("wrote", "write"),
        ("written", "write"), ("stood", "stand"), ("heard", "hear"), ("felt", "feel"), ("kept", "keep"),
        ("met", "meet"), ("ran", "run"), ("paid", "pay"), ("sent", "send"), ("fell", "fall"), ("fallen", "fall"),
        ("rose", "rise"), ("risen", "rise"), ("led", "lead"), ("won", "win"), ("lost", "lose"), ("spoke", "speak"),
        ("spoken", "speak"), ("chose", "choose"), ("chosen", "choose"), ("drove", "drive"), ("driven", "drive"),
        ("grew", "grow"), ("grown", "grow"), ("shown", "show"), ("built", "build"), ("bought", "buy"),
        ("caught", "catch"), ("taught", "teach"), ("fought", "fight"), ("sold", "sell"), ("spent", "spend"),
        ("meant", "mean"), ("understood", "understand"), ("struck", "strike"), ("died", "die"), ("dying", "die"),
        ("lied", "lie"), ("lying", "lie"), ("tied", "tie"), ("broken", "break"), ("broke", "break"),
        ("stolen", "steal"), ("eaten", "eat"), ("forgotten", "forget"), ("hidden", "hide"), ("hit", "hit"),
    ]),
    (Category::Adjective, &[
        ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"), ("further", "far"),
        ("farther", "far"), ("furthest", "far"), ("farthest", "far"), ("more", "more"), ("less", "less"),
        ("other", "other"), ("former", "former"), ("latter", "latter"), ("proper", "proper"),
    ]),
    (Category::Adverb, &[("better", "well"), ("best", "well")]),
];

/// Stem endings after which a dropped silent `e` is restored: `creat` -> `create`.
const SILENT_E_ENDINGS: &[&str] = &[
    "at", "iz", "yz", "bl", "pl", "tl", "dl", "gl", "iv", "uc", "nc", "rc", "rg", "dg", "ov", "lv", "rv",
];

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<(Category, String), String>,
    vocabulary: Option<HashSet<(Category, String)>>,
}

impl Default for Lemmatizer {
    fn default() -> Self { Self::english() }
}

impl Lemmatizer {
    /// Built-in English exception table, no vocabulary.
    pub fn english() -> Self {
        let exceptions = BUILTIN_EXCEPTIONS
            .iter()
            .flat_map(|(cat, pairs)| pairs.iter().map(move |(form, lemma)| ((*cat, form.to_string()), lemma.to_string())))
            .collect();
        Self { exceptions, vocabulary: None }
    }

    pub fn has_vocabulary(&self) -> bool { self.vocabulary.is_some() }

    pub fn add_exception(&mut self, form: &str, category: Category, lemma: &str) {
        self.exceptions.insert((category, form.to_string()), lemma.to_string());
    }

    pub fn add_to_vocabulary(&mut self, lemma: &str, category: Category) {
        self.vocabulary
            .get_or_insert_with(HashSet::new)
            .insert((category, lemma.to_string()));
    }

    /// `form<TAB>category<TAB>lemma` lines.
    pub fn load_exceptions<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let mut loaded = 0;
        for (lineno, fields) in read_tab_lines(path)? {
            match fields.as_slice() {
                [form, cat, lemma] => {
                    let cat = parse_category(path, lineno, cat)?;
                    self.add_exception(form, cat, lemma);
                    loaded += 1;
                }
                _ => return Err(Error::Config(format!("{}:{lineno}: expected form<TAB>category<TAB>lemma", path.display()))),
            }
        }
        Ok(loaded)
    }

    /// `lemma<TAB>category` lines. Loading any vocabulary switches the
    /// lemmatizer to dictionary-checked candidates.
    pub fn load_vocabulary<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let mut loaded = 0;
        for (lineno, fields) in read_tab_lines(path)? {
            match fields.as_slice() {
                [lemma, cat] => {
                    let cat = parse_category(path, lineno, cat)?;
                    self.add_to_vocabulary(lemma, cat);
                    loaded += 1;
                }
                _ => return Err(Error::Config(format!("{}:{lineno}: expected lemma<TAB>category", path.display()))),
            }
        }
        Ok(loaded)
    }

    /// Lemma of a lowercase `word` in `category`.
    pub fn lemmatize(&self, word: &str, category: Category) -> String {
        self.lemmatize_inner(word, category, None)
    }

    /// Lemma of a lowercase `word` carrying the Penn Treebank `tag`. Fails on
    /// tags outside the noun, verb, adjective, adverb and foreign-word classes.
    pub fn lemmatize_tagged(&self, word: &str, tag: &str) -> Result<String> {
        let category = Category::from_tag(tag)?;
        Ok(self.lemmatize_inner(word, category, Some(tag)))
    }

    fn lemmatize_inner(&self, word: &str, category: Category, tag: Option<&str>) -> String {
        if let Some(lemma) = self.exceptions.get(&(category, word.to_string())) {
            return lemma.clone();
        }
        match &self.vocabulary {
            Some(vocab) => std::iter::once(word.to_string())
                .chain(candidates(word, category))
                .filter(|c| vocab.contains(&(category, c.clone())))
                .min_by_key(|c| c.len())
                .unwrap_or_else(|| word.to_string()),
            None => guess(word, category, tag),
        }
    }
}

fn read_tab_lines(path: &Path) -> Result<Vec<(usize, Vec<String>)>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'))
        .map(|(i, l)| (i + 1, l.split('\t').map(|f| f.trim().to_string()).collect()))
        .collect())
}

fn parse_category(path: &Path, lineno: usize, name: &str) -> Result<Category> {
    Category::parse(name)
        .ok_or_else(|| Error::Config(format!("{}:{lineno}: unknown category `{name}`", path.display())))
}

/// Every candidate the detachment rules produce, in rule order.
fn candidates(word: &str, category: Category) -> Vec<String> {
    category
        .rules()
        .iter()
        .filter(|(suffix, _)| word.len() > suffix.len() && word.ends_with(suffix))
        .map(|(suffix, replacement)| format!("{}{}", &word[..word.len() - suffix.len()], replacement))
        .collect()
}

fn is_vowel(c: char) -> bool { matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') }

/// `runn` -> `run`, `stopp` -> `stop`; `add`, `fall`, `pass` are left alone.
fn undouble(stem: &str) -> Option<String> {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 4 {
        return None;
    }
    let (a, b, c, d) = (chars[n - 4], chars[n - 3], chars[n - 2], chars[n - 1]);
    let doubled = c == d && !is_vowel(d) && !matches!(d, 'l' | 's' | 'z' | 'f');
    if doubled && is_vowel(b) && !is_vowel(a) {
        Some(chars[..n - 1].iter().collect())
    } else {
        None
    }
}

fn needs_silent_e(stem: &str) -> bool {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 2 {
        return false;
    }
    if SILENT_E_ENDINGS.iter().any(|e| stem.ends_with(e)) {
        return true;
    }
    // us -> use, caus -> cause
    if n <= 4 && stem.ends_with("us") {
        return true;
    }
    // monosyllabic consonant-vowel-consonant: mak -> make, hop -> hope
    let vowel_groups = chars
        .iter()
        .zip(std::iter::once(&' ').chain(chars.iter()))
        .filter(|(c, prev)| is_vowel(**c) && !is_vowel(**prev))
        .count();
    n >= 3
        && vowel_groups == 1
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
        && is_vowel(chars[n - 2])
        && !is_vowel(chars[n - 3])
}

fn restore_stem(stem: &str) -> String {
    if let Some(s) = undouble(stem) {
        return s;
    }
    if needs_silent_e(stem) {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn strip_plural(word: &str) -> String {
    let len = word.len();
    if len <= 3 || ["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
        return word.to_string();
    }
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..len - 3]);
    }
    if ["sses", "xes", "zes", "ches", "shes"].iter().any(|s| word.ends_with(s)) {
        return word[..len - 2].to_string();
    }
    if len > 5 && word.ends_with("men") {
        return format!("{}man", &word[..len - 3]);
    }
    if word.ends_with('s') {
        return word[..len - 1].to_string();
    }
    word.to_string()
}

fn guess_noun(word: &str, tag: Option<&str>) -> String {
    match tag {
        Some("NN") | Some("NNP") | Some("FW") => word.to_string(),
        _ => strip_plural(word),
    }
}

fn strip_verb_s(word: &str) -> String {
    let len = word.len();
    if len <= 3 || word.ends_with("ss") {
        return word.to_string();
    }
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..len - 3]);
    }
    if ["sses", "xes", "zes", "ches", "shes", "oes"].iter().any(|s| word.ends_with(s)) {
        return word[..len - 2].to_string();
    }
    if word.ends_with('s') {
        return word[..len - 1].to_string();
    }
    word.to_string()
}

fn strip_verb_ed(word: &str) -> String {
    let len = word.len();
    if len > 4 && word.ends_with("ied") {
        return format!("{}y", &word[..len - 3]);
    }
    if len > 3 && word.ends_with("ed") {
        return restore_stem(&word[..len - 2]);
    }
    word.to_string()
}

fn strip_verb_ing(word: &str) -> String {
    let len = word.len();
    if len > 4 && word.ends_with("ing") {
        return restore_stem(&word[..len - 3]);
    }
    word.to_string()
}

fn guess_verb(word: &str, tag: Option<&str>) -> String {
    match tag {
        Some("VB") | Some("VBP") => word.to_string(),
        Some("VBZ") => strip_verb_s(word),
        Some("VBD") | Some("VBN") => strip_verb_ed(word),
        Some("VBG") => strip_verb_ing(word),
        _ => {
            if word.ends_with("ing") {
                strip_verb_ing(word)
            } else if word.ends_with("ed") {
                strip_verb_ed(word)
            } else {
                strip_verb_s(word)
            }
        }
    }
}

fn guess_adjective(word: &str, tag: Option<&str>) -> String {
    if matches!(tag, Some("JJ")) {
        return word.to_string();
    }
    let len = word.len();
    if len > 5 && word.ends_with("iest") {
        return format!("{}y", &word[..len - 4]);
    }
    if len > 4 && word.ends_with("ier") {
        return format!("{}y", &word[..len - 3]);
    }
    if len > 5 && word.ends_with("est") {
        return restore_stem(&word[..len - 3]);
    }
    if len > 4 && word.ends_with("er") {
        return restore_stem(&word[..len - 2]);
    }
    word.to_string()
}

fn guess(word: &str, category: Category, tag: Option<&str>) -> String {
    match category {
        Category::Noun => guess_noun(word, tag),
        Category::Verb => guess_verb(word, tag),
        Category::Adjective => guess_adjective(word, tag),
        Category::Adverb => word.to_string(),
    }
}
