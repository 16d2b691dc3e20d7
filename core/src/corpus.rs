use crate::{Corpus, Document, Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One crawled article as written by the collection stage.
#[derive(Debug, Deserialize)]
struct InputArticle {
    #[serde(alias = "id")]
    url: String,
    #[serde(alias = "body")]
    content: String,
    #[serde(default)]
    title: Option<String>,
}

fn article_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect()
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn invalid(path: &Path, line: usize, e: impl std::fmt::Display) -> Error {
    Error::InvalidArticle { path: path.display().to_string(), line, message: e.to_string() }
}

fn read_jsonl(path: &Path, source: &str, out: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let article: InputArticle = serde_json::from_str(&line).map_err(|e| invalid(path, lineno + 1, e))?;
        out.push(into_document(article, source));
    }
    Ok(())
}

fn read_json(path: &Path, source: &str, out: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(|e| invalid(path, 0, e))?;
    match json {
        serde_json::Value::Array(arr) => {
            for (i, v) in arr.into_iter().enumerate() {
                let article: InputArticle = serde_json::from_value(v).map_err(|e| invalid(path, i + 1, e))?;
                out.push(into_document(article, source));
            }
        }
        serde_json::Value::Object(_) => {
            let article: InputArticle = serde_json::from_value(json).map_err(|e| invalid(path, 1, e))?;
            out.push(into_document(article, source));
        }
        _ => return Err(invalid(path, 0, "expected an article object or an array of them")),
    }
    Ok(())
}

fn into_document(article: InputArticle, source: &str) -> Document {
    let mut doc = Document::new(article.url, source, article.content);
    doc.title = article.title;
    doc
}

/// Read every `*.jsonl` / `*.json` file under `root`, in file-name order.
/// Each file is one source, named after its stem. Ids must be unique across
/// the whole corpus.
pub fn load_articles<P: AsRef<Path>>(root: P) -> Result<Corpus> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(Error::Config(format!("articles directory {} does not exist", root.display())));
    }
    let mut documents = Vec::new();
    for file in article_files(root) {
        let source = source_name(&file);
        let before = documents.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &source, &mut documents)?;
        } else {
            read_json(&file, &source, &mut documents)?;
        }
        tracing::info!(source = %source, articles = documents.len() - before, "read articles");
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(documents.len());
    for doc in &documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(Error::DuplicateDocument(doc.id.clone()));
        }
    }
    Ok(Corpus::new(documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_sources_in_file_name_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("foxnews.jsonl"),
            "{\"url\":\"f1\",\"content\":\"Stocks fell.\"}\n\n{\"url\":\"f2\",\"content\":\"\",\"title\":\"Empty\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("bcc.json"), r#"[{"id":"b1","body":"Rain again."}]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let corpus = load_articles(dir.path()).unwrap();
        let ids: Vec<&str> = corpus.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "f1", "f2"]);
        assert_eq!(corpus.sources(), vec!["bcc", "foxnews"]);
        assert_eq!(corpus.documents[2].title.as_deref(), Some("Empty"));
        assert_eq!(corpus.documents[0].raw_text, "Rain again.");
    }

    #[test]
    fn duplicate_urls_across_sources_are_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"url\":\"same\",\"content\":\"x\"}\n").unwrap();
        fs::write(dir.path().join("b.jsonl"), "{\"url\":\"same\",\"content\":\"y\"}\n").unwrap();
        assert!(matches!(load_articles(dir.path()), Err(Error::DuplicateDocument(id)) if id == "same"));
    }

    #[test]
    fn bad_line_reports_position() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"url\":\"1\",\"content\":\"x\"}\n{\"url\":2}\n").unwrap();
        match load_articles(dir.path()) {
            Err(Error::InvalidArticle { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidArticle, got {other:?}"),
        }
    }
}
