//! The index build as a sequence of batch stages.
//!
//! `ingest -> tag -> clean -> count -> weight`. Each stage reads the whole
//! corpus, adds one derived field to every document and rewrites the record
//! store; [`run_stage`] runs a single stage against an existing store and
//! [`run_build`] runs all of them in memory, persisting after each.

use crate::config::Settings;
use crate::corpus::load_articles;
use crate::counter::{count_lemmas, total};
use crate::index::build_index;
use crate::normalizer::{clean, lemmatize};
use crate::persist::{save_index, IndexPaths};
use crate::store::RecordStore;
use crate::tokenizer::tag_text;
use crate::{Corpus, Error, InvertedIndex, Resources, Result};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Tag,
    Clean,
    Count,
    Weight,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Stage::Ingest, Stage::Tag, Stage::Clean, Stage::Count, Stage::Weight];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Tag => "tag",
            Stage::Clean => "clean",
            Stage::Count => "count",
            Stage::Weight => "weight",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| Error::Config(format!("unknown stage `{s}`")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub documents: usize,
    pub lemmas: usize,
    pub postings: usize,
    pub elapsed: Duration,
}

fn check_count(stage: Stage, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::StageCount { stage: stage.name(), expected, actual });
    }
    Ok(())
}

fn missing(stage: Stage, document: &str, field: &'static str) -> Error {
    Error::MissingField { stage: stage.name(), document: document.to_string(), field }
}

/// PoSTags of every document. Fields derived from earlier tags are cleared.
pub fn tag_stage(resources: &Resources, corpus: &mut Corpus) -> Result<()> {
    let tagged: Vec<_> = corpus.documents.iter().map(|d| tag_text(resources, &d.raw_text)).collect();
    check_count(Stage::Tag, corpus.document_count(), tagged.len())?;
    for (doc, tokens) in corpus.documents.iter_mut().zip(tagged) {
        doc.tagged = Some(tokens);
        doc.cleaned = None;
        doc.lemma_counts = None;
    }
    Ok(())
}

/// PoSTags_cleaned of every document. Earlier lemma counts are cleared.
pub fn clean_stage(resources: &Resources, corpus: &mut Corpus) -> Result<()> {
    let mut cleaned = Vec::with_capacity(corpus.document_count());
    for doc in &corpus.documents {
        let tagged = doc.tagged.as_ref().ok_or_else(|| missing(Stage::Clean, &doc.id, "tagged"))?;
        cleaned.push(clean(resources, tagged));
    }
    check_count(Stage::Clean, corpus.document_count(), cleaned.len())?;
    for (doc, tokens) in corpus.documents.iter_mut().zip(cleaned) {
        doc.cleaned = Some(tokens);
        doc.lemma_counts = None;
    }
    Ok(())
}

/// Lemma counts of every document.
pub fn count_stage(resources: &Resources, corpus: &mut Corpus) -> Result<()> {
    let mut counts = Vec::with_capacity(corpus.document_count());
    for doc in &corpus.documents {
        let cleaned = doc.cleaned.as_ref().ok_or_else(|| missing(Stage::Count, &doc.id, "cleaned"))?;
        let lemmas = lemmatize(resources, cleaned).map_err(|e| Error::InStage {
            stage: Stage::Count.name(),
            document: doc.id.clone(),
            source: Box::new(e),
        })?;
        let c = count_lemmas(&lemmas);
        if total(&c) != cleaned.len() {
            return Err(Error::CountMismatch { document: doc.id.clone(), counted: total(&c), tokens: cleaned.len() });
        }
        counts.push(c);
    }
    check_count(Stage::Count, corpus.document_count(), counts.len())?;
    for (doc, c) in corpus.documents.iter_mut().zip(counts) {
        doc.lemma_counts = Some(c);
    }
    Ok(())
}

fn persist_documents(store: &RecordStore, stage: Stage, corpus: &Corpus) -> Result<()> {
    store.replace_documents(corpus)?;
    check_count(stage, corpus.document_count(), store.document_count()?)
}

/// Weight the corpus and write both the lemma table and the index files.
pub fn weight_stage(store: &RecordStore, index_paths: &IndexPaths, corpus: &Corpus) -> Result<InvertedIndex> {
    let index = build_index(corpus)?;
    store.replace_lemmas(&index)?;
    check_count(Stage::Weight, index.num_lemmas(), store.lemma_count()?)?;
    let meta = save_index(index_paths, &index)?;
    tracing::info!(
        path = %index_paths.root.display(),
        num_docs = meta.num_docs,
        num_lemmas = meta.num_lemmas,
        num_postings = meta.num_postings,
        "wrote index"
    );
    Ok(index)
}

fn timed<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let out = f()?;
    tracing::info!(stage = stage.name(), elapsed_ms = start.elapsed().as_millis() as u64, "stage finished");
    Ok(out)
}

/// Run one stage against the record store at `settings.store_dir`, as a
/// standalone batch job.
pub fn run_stage(stage: Stage, settings: &Settings, resources: &Resources) -> Result<()> {
    let store = RecordStore::open(&settings.store_dir)?;
    run_stage_in(&store, stage, settings, resources)
}

pub fn run_stage_in(store: &RecordStore, stage: Stage, settings: &Settings, resources: &Resources) -> Result<()> {
    timed(stage, || {
        if stage == Stage::Ingest {
            let corpus = load_articles(&settings.articles_dir)?;
            return persist_documents(store, stage, &corpus);
        }
        let mut corpus = store.load_corpus()?;
        match stage {
            Stage::Ingest => unreachable!("handled above"),
            Stage::Tag => tag_stage(resources, &mut corpus)?,
            Stage::Clean => clean_stage(resources, &mut corpus)?,
            Stage::Count => count_stage(resources, &mut corpus)?,
            Stage::Weight => {
                weight_stage(store, &IndexPaths::new(&settings.index_dir), &corpus)?;
                return Ok(());
            }
        }
        persist_documents(store, stage, &corpus)
    })
}

/// Full build: every stage in order, persisting the record store after each.
pub fn run_build(settings: &Settings, resources: &Resources) -> Result<BuildReport> {
    let store = RecordStore::open(&settings.store_dir)?;
    run_build_in(&store, settings, resources)
}

pub fn run_build_in(store: &RecordStore, settings: &Settings, resources: &Resources) -> Result<BuildReport> {
    let start = Instant::now();
    let mut corpus = timed(Stage::Ingest, || {
        let corpus = load_articles(&settings.articles_dir)?;
        persist_documents(store, Stage::Ingest, &corpus)?;
        Ok(corpus)
    })?;
    timed(Stage::Tag, || {
        tag_stage(resources, &mut corpus)?;
        persist_documents(store, Stage::Tag, &corpus)
    })?;
    timed(Stage::Clean, || {
        clean_stage(resources, &mut corpus)?;
        persist_documents(store, Stage::Clean, &corpus)
    })?;
    timed(Stage::Count, || {
        count_stage(resources, &mut corpus)?;
        persist_documents(store, Stage::Count, &corpus)
    })?;
    let index = timed(Stage::Weight, || weight_stage(store, &IndexPaths::new(&settings.index_dir), &corpus))?;

    let report = BuildReport {
        documents: corpus.document_count(),
        lemmas: index.num_lemmas(),
        postings: index.num_postings(),
        elapsed: start.elapsed(),
    };
    tracing::debug!(elapsed_s = report.elapsed.as_secs_f64(), "all stages finished");
    Ok(report)
}
