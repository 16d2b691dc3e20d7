use newsindex_core::config::Settings;
use newsindex_core::counter::total;
use newsindex_core::persist::{load_index, IndexPaths, IndexReader};
use newsindex_core::pipeline::{run_build_in, run_stage_in, Stage};
use newsindex_core::query::answer_query;
use newsindex_core::store::RecordStore;
use newsindex_core::{Error, Resources};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const FOXNEWS: &str = r#"{"url":"https://fox.example/1","content":"Heavy floods destroyed several bridges. Officials warned residents about rising rivers."}
{"url":"https://fox.example/2","content":"Stock markets rallied as investors welcomed the new budget."}

{"url":"https://fox.example/3","content":""}
"#;

const BCC: &str = r#"[
  {"url":"https://bcc.example/1","title":"Storm","content":"The storm flooded coastal towns and damaged homes."},
  {"url":"https://bcc.example/2","content":"Markets fell sharply after the election results."}
]"#;

fn write_articles(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("foxnews.jsonl"), FOXNEWS).unwrap();
    fs::write(dir.join("bcc.json"), BCC).unwrap();
}

fn settings(root: &Path, run: &str) -> Settings {
    Settings {
        articles_dir: root.join("articles"),
        store_dir: root.join(run).join("store"),
        index_dir: root.join(run).join("index"),
        ..Settings::default()
    }
}

fn index_files(dir: &Path) -> Vec<Vec<u8>> {
    ["docs.bin", "lexicon.bin", "postings.bin", "meta.json"]
        .iter()
        .map(|f| fs::read(dir.join(f)).unwrap())
        .collect()
}

#[test]
fn build_produces_consistent_records_and_index() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let s = settings(root.path(), "one");
    let store = RecordStore::open(&s.store_dir).unwrap();
    let report = run_build_in(&store, &s, &Resources::english()).unwrap();
    assert_eq!(report.documents, 5);
    assert!(report.lemmas > 0);

    let corpus = store.load_corpus().unwrap();
    assert_eq!(corpus.document_count(), 5);
    for doc in &corpus.documents {
        let tagged = doc.tagged.as_ref().unwrap();
        let cleaned = doc.cleaned.as_ref().unwrap();
        assert!(cleaned.len() <= tagged.len());
        assert_eq!(total(doc.lemma_counts.as_ref().unwrap()), cleaned.len());
    }

    let index = load_index(&IndexPaths::new(&s.index_dir)).unwrap();
    assert_eq!(index.document_count, 5);
    assert_eq!(index.num_lemmas(), report.lemmas);
    assert_eq!(store.lemma_count().unwrap(), report.lemmas);
    for (lemma, docs) in &index.lemmas {
        assert!(!docs.is_empty() && docs.len() <= 5, "{lemma}");
        assert!(docs.values().all(|w| *w >= 0.0));
        assert_eq!(store.lemma_weights(lemma).unwrap().unwrap().len(), docs.len());
    }
    assert!(index.lemmas.values().all(|docs| !docs.contains_key("https://fox.example/3")));
}

#[test]
fn rebuilding_gives_identical_index_files() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let resources = Resources::english();

    let first = settings(root.path(), "first");
    run_build_in(&RecordStore::open(&first.store_dir).unwrap(), &first, &resources).unwrap();
    let second = settings(root.path(), "second");
    run_build_in(&RecordStore::open(&second.store_dir).unwrap(), &second, &resources).unwrap();

    assert_eq!(index_files(&first.index_dir), index_files(&second.index_dir));
}

#[test]
fn separate_stages_match_a_full_build() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let resources = Resources::english();

    let full = settings(root.path(), "full");
    run_build_in(&RecordStore::open(&full.store_dir).unwrap(), &full, &resources).unwrap();

    let staged = settings(root.path(), "staged");
    let store = RecordStore::open(&staged.store_dir).unwrap();
    for stage in Stage::ALL {
        run_stage_in(&store, stage, &staged, &resources).unwrap();
    }
    assert_eq!(index_files(&full.index_dir), index_files(&staged.index_dir));
}

#[test]
fn stage_out_of_order_is_rejected() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let s = settings(root.path(), "bad");
    let store = RecordStore::open(&s.store_dir).unwrap();
    let resources = Resources::english();
    run_stage_in(&store, Stage::Ingest, &s, &resources).unwrap();
    let err = run_stage_in(&store, Stage::Count, &s, &resources).unwrap_err();
    assert!(matches!(err, Error::MissingField { stage: "count", field: "cleaned", .. }));
}

#[test]
fn built_index_answers_queries() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let s = settings(root.path(), "q");
    let resources = Resources::english();
    run_build_in(&RecordStore::open(&s.store_dir).unwrap(), &s, &resources).unwrap();

    let reader = IndexReader::open(&IndexPaths::new(&s.index_dir)).unwrap();
    let lemmas = vec!["market".to_string()];
    let result = answer_query(&reader, &lemmas).unwrap();
    let ids = result.document_ids();
    assert!(ids.contains(&"https://fox.example/2"));
    assert!(ids.contains(&"https://bcc.example/2"));
    assert!(result.hits.iter().all(|h| h.total_weight > 0.0));

    let in_memory = load_index(&IndexPaths::new(&s.index_dir)).unwrap();
    assert_eq!(answer_query(&in_memory, &lemmas).unwrap(), result);
    assert!(answer_query(&reader, &[]).unwrap().is_empty());
}

#[test]
fn weighting_after_a_retag_needs_the_later_stages_again() {
    let root = tempdir().unwrap();
    write_articles(&root.path().join("articles"));
    let s = settings(root.path(), "retag");
    let store = RecordStore::open(&s.store_dir).unwrap();
    let resources = Resources::english();
    for stage in [Stage::Ingest, Stage::Tag, Stage::Clean, Stage::Count, Stage::Tag] {
        run_stage_in(&store, stage, &s, &resources).unwrap();
    }
    let err = run_stage_in(&store, Stage::Weight, &s, &resources).unwrap_err();
    assert!(matches!(err, Error::MissingField { stage: "weight", .. }));
    assert!(store.load_corpus().unwrap().documents.iter().all(|d| d.cleaned.is_none()));
}
