//! On-disk inverted index.
//!
//! ```text
//! <root>/docs.bin      bincode Vec<String>        document ids, sorted; postings refer to positions here
//! <root>/lexicon.bin   bincode Vec<LexiconEntry>  sorted by lemma, binary searchable
//! <root>/postings.bin  concatenated bincode Vec<Posting> blocks, one per lemma, sorted by doc
//! <root>/meta.json     MetaFile
//! ```
//!
//! A lookup binary-searches the lexicon and decodes only that lemma's block.

use crate::{DocOrd, Error, InvertedIndex, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u32,
    pub num_lemmas: u32,
    pub num_postings: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub lemma: String,
    /// Number of documents containing the lemma.
    pub doc_freq: u32,
    /// Byte range of the lemma's block in postings.bin.
    pub offset: u64,
    pub len: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocOrd,
    pub weight: f64,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn lexicon(&self) -> PathBuf { self.root.join("lexicon.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::MalformedIndex(format!("missing {}", path.display())),
        _ => Error::Io(e),
    })?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn decode<T: serde::de::DeserializeOwned>(what: &Path, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| Error::MalformedIndex(format!("{}: {e}", what.display())))
}

/// Write `index` under `paths.root`, replacing any previous index there.
/// Output bytes depend only on the index contents.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;

    let ords: HashMap<&str, DocOrd> = index
        .documents
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i as DocOrd))
        .collect();

    let mut lexicon: Vec<LexiconEntry> = Vec::with_capacity(index.lemmas.len());
    let mut postings_buf: Vec<u8> = Vec::new();
    let mut num_postings = 0u64;
    for (lemma, docs) in &index.lemmas {
        let mut postings: Vec<Posting> = Vec::with_capacity(docs.len());
        for (id, &weight) in docs {
            let doc = *ords.get(id.as_str()).ok_or_else(|| {
                Error::MalformedIndex(format!("lemma `{lemma}` refers to unknown document {id}"))
            })?;
            postings.push(Posting { doc, weight });
        }
        postings.sort_by_key(|p| p.doc);
        let bytes = bincode::serialize(&postings)?;
        lexicon.push(LexiconEntry {
            lemma: lemma.clone(),
            doc_freq: postings.len() as u32,
            offset: postings_buf.len() as u64,
            len: bytes.len() as u32,
        });
        postings_buf.extend_from_slice(&bytes);
        num_postings += postings.len() as u64;
    }

    write_file(&paths.docs(), &bincode::serialize(&index.documents)?)?;
    write_file(&paths.lexicon(), &bincode::serialize(&lexicon)?)?;
    write_file(&paths.postings(), &postings_buf)?;
    let meta = MetaFile {
        version: FORMAT_VERSION,
        num_docs: index.documents.len() as u32,
        num_lemmas: lexicon.len() as u32,
        num_postings,
    };
    write_file(&paths.meta(), serde_json::to_string_pretty(&meta)?.as_bytes())?;
    Ok(meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let buf = read_file(&path)?;
    serde_json::from_slice(&buf).map_err(|e| Error::MalformedIndex(format!("{}: {e}", path.display())))
}

/// Read-only view of a serialized index. The lexicon and document table are
/// decoded up front; postings blocks are decoded on lookup.
#[derive(Debug)]
pub struct IndexReader {
    meta: MetaFile,
    docs: Vec<String>,
    lexicon: Vec<LexiconEntry>,
    postings: Vec<u8>,
}

impl IndexReader {
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let meta = load_meta(paths)?;
        if meta.version != FORMAT_VERSION {
            return Err(Error::MalformedIndex(format!(
                "format version {} (expected {FORMAT_VERSION})",
                meta.version
            )));
        }
        let docs: Vec<String> = decode(&paths.docs(), &read_file(&paths.docs())?)?;
        let lexicon: Vec<LexiconEntry> = decode(&paths.lexicon(), &read_file(&paths.lexicon())?)?;
        let postings = read_file(&paths.postings())?;

        if docs.len() != meta.num_docs as usize || lexicon.len() != meta.num_lemmas as usize {
            return Err(Error::MalformedIndex(format!(
                "meta.json lists {} docs and {} lemmas, files hold {} and {}",
                meta.num_docs,
                meta.num_lemmas,
                docs.len(),
                lexicon.len()
            )));
        }
        if lexicon.windows(2).any(|w| w[0].lemma >= w[1].lemma) {
            return Err(Error::MalformedIndex("lexicon is not sorted".into()));
        }
        let file_len = postings.len() as u64;
        if let Some(e) = lexicon
            .iter()
            .find(|e| e.offset.checked_add(e.len as u64).map_or(true, |end| end > file_len))
        {
            return Err(Error::MalformedIndex(format!("postings of `{}` run past end of file", e.lemma)));
        }
        tracing::debug!(num_docs = docs.len(), num_lemmas = lexicon.len(), "opened index");
        Ok(Self { meta, docs, lexicon, postings })
    }

    pub fn meta(&self) -> &MetaFile { &self.meta }

    pub fn documents(&self) -> &[String] { &self.docs }

    pub fn lemmas(&self) -> impl Iterator<Item = &str> + '_ {
        self.lexicon.iter().map(|e| e.lemma.as_str())
    }

    pub fn entry(&self, lemma: &str) -> Option<&LexiconEntry> {
        self.lexicon
            .binary_search_by(|e| e.lemma.as_str().cmp(lemma))
            .ok()
            .map(|i| &self.lexicon[i])
    }

    pub fn document_id(&self, doc: DocOrd) -> Option<&str> {
        self.docs.get(doc as usize).map(String::as_str)
    }

    /// Postings of `lemma`, sorted by document, or `None` if it is not indexed.
    pub fn postings(&self, lemma: &str) -> Result<Option<Vec<Posting>>> {
        let Some(entry) = self.entry(lemma) else {
            return Ok(None);
        };
        let block = usize::try_from(entry.offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(entry.len as usize)?))
            .and_then(|range| self.postings.get(range))
            .ok_or_else(|| Error::MalformedIndex(format!("postings of `{lemma}` lie outside postings.bin")))?;
        let postings: Vec<Posting> = bincode::deserialize(block)
            .map_err(|e| Error::MalformedIndex(format!("postings of `{lemma}`: {e}")))?;
        if let Some(p) = postings.iter().find(|p| p.doc as usize >= self.docs.len()) {
            return Err(Error::MalformedIndex(format!("postings of `{lemma}` refer to document #{}", p.doc)));
        }
        Ok(Some(postings))
    }

    /// Decode everything back into the lemma -> document -> weight mapping.
    pub fn to_index(&self) -> Result<InvertedIndex> {
        let mut lemmas = BTreeMap::new();
        for entry in &self.lexicon {
            let postings = self.postings(&entry.lemma)?.unwrap_or_default();
            let docs: BTreeMap<String, f64> = postings
                .into_iter()
                .map(|p| (self.docs[p.doc as usize].clone(), p.weight))
                .collect();
            lemmas.insert(entry.lemma.clone(), docs);
        }
        Ok(InvertedIndex { document_count: self.docs.len() as u32, documents: self.docs.clone(), lemmas })
    }
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    IndexReader::open(paths)?.to_index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.insert("economy", "https://a.example/1", 0.12);
        index.insert("market", "https://a.example/1", 0.05);
        index.insert("market", "https://b.example/2", 0.2);
        index.insert("zeal", "https://c.example/3", 1.0 / 3.0);
        index
    }

    #[test]
    fn round_trip_recovers_exact_weights() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = sample();
        let meta = save_index(&paths, &index).unwrap();
        assert_eq!(meta.num_docs, 3);
        assert_eq!(meta.num_lemmas, 3);
        assert_eq!(meta.num_postings, 4);
        let loaded = load_index(&paths).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.weight("zeal", "https://c.example/3").unwrap().to_bits(), (1.0f64 / 3.0).to_bits());
    }

    #[test]
    fn single_lemma_lookup() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample()).unwrap();
        let reader = IndexReader::open(&paths).unwrap();
        let market = reader.postings("market").unwrap().unwrap();
        assert_eq!(market.len(), 2);
        assert!(market.windows(2).all(|w| w[0].doc < w[1].doc));
        assert_eq!(reader.document_id(market[1].doc), Some("https://b.example/2"));
        assert_eq!(reader.entry("market").unwrap().doc_freq, 2);
        assert!(reader.postings("absent").unwrap().is_none());
    }

    #[test]
    fn saving_twice_is_byte_identical() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        save_index(&IndexPaths::new(a.path()), &sample()).unwrap();
        save_index(&IndexPaths::new(b.path()), &sample()).unwrap();
        for name in ["docs.bin", "lexicon.bin", "postings.bin", "meta.json"] {
            let x = std::fs::read(a.path().join(name)).unwrap();
            let y = std::fs::read(b.path().join(name)).unwrap();
            assert_eq!(x, y, "{name} differs");
        }
    }

    #[test]
    fn missing_index_is_reported() {
        let dir = tempdir().unwrap();
        let err = IndexReader::open(&IndexPaths::new(dir.path().join("nothing"))).unwrap_err();
        assert!(matches!(err, Error::MalformedIndex(_)));
    }

    #[test]
    fn truncated_postings_are_reported() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample()).unwrap();
        std::fs::write(dir.path().join("postings.bin"), [0u8; 3]).unwrap();
        assert!(matches!(IndexReader::open(&paths), Err(Error::MalformedIndex(_))));
    }

    #[test]
    fn lexicon_offsets_past_the_end_are_reported() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample()).unwrap();
        let mut lexicon: Vec<LexiconEntry> =
            bincode::deserialize(&std::fs::read(dir.path().join("lexicon.bin")).unwrap()).unwrap();
        lexicon[0].offset = u64::MAX;
        lexicon[0].len = 5;
        std::fs::write(dir.path().join("lexicon.bin"), bincode::serialize(&lexicon).unwrap()).unwrap();
        assert!(matches!(IndexReader::open(&paths), Err(Error::MalformedIndex(_))));
    }

    #[test]
    fn corrupt_lexicon_is_reported() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample()).unwrap();
        std::fs::write(dir.path().join("lexicon.bin"), b"not bincode").unwrap();
        assert!(matches!(IndexReader::open(&paths), Err(Error::MalformedIndex(_))));
    }
}
