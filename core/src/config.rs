use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON settings file.
pub const CONFIG_ENV: &str = "NEWSINDEX_CONFIG";

/// Optional files that override or extend the built-in linguistic resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Extra tagger lexicon, one `word<TAB>TAG` per line.
    pub lexicon: Option<PathBuf>,
    /// Replacement stopword list, one word per line.
    pub stopwords: Option<PathBuf>,
    /// Extra irregular forms, `form<TAB>category<TAB>lemma` per line.
    pub lemma_exceptions: Option<PathBuf>,
    /// Known lemmas, `lemma<TAB>category` per line. Enables dictionary-checked lemmatization.
    pub vocabulary: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of crawled `*.jsonl` / `*.json` article files, one file per source.
    pub articles_dir: PathBuf,
    /// sled database holding per-document records and the lemma table.
    pub store_dir: PathBuf,
    /// Output directory of the serialized inverted index.
    pub index_dir: PathBuf,
    pub resources: ResourceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            articles_dir: PathBuf::from("./data/articles"),
            store_dir: PathBuf::from("./data/store"),
            index_dir: PathBuf::from("./data/index"),
            resources: ResourceSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| Error::Config(format!("cannot open {}: {e}", path.display())))?;
        let settings: Settings = serde_json::from_reader(BufReader::new(f))?;
        Ok(settings)
    }

    /// Defaults, overlaid by the file named explicitly or through `NEWSINDEX_CONFIG`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}
