use anyhow::{bail, Context, Result};
use newsindex_core::normalizer::normalize_query;
use newsindex_core::persist::{IndexPaths, IndexReader};
use newsindex_core::query::{answer_query, QueryResult};
use newsindex_core::Resources;
use prettytable::{format, row, Cell, Row, Table};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::path::Path;
use std::time::{Duration, Instant};

/// Query length and number of random queries of that length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchStep {
    pub query_len: usize,
    pub queries: u32,
}

pub const DEFAULT_PLAN: &str = "1x20,2x20,3x30,4x30";

/// Parse `"1x20,2x20"` into steps.
pub fn parse_plan(plan: &str) -> Result<Vec<BenchStep>> {
    let mut steps = Vec::new();
    for part in plan.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (len, count) = part
            .split_once(['x', 'X'])
            .with_context(|| format!("bench step `{part}` is not LENxCOUNT"))?;
        let query_len: usize = len.trim().parse().with_context(|| format!("bad query length in `{part}`"))?;
        let queries: u32 = count.trim().parse().with_context(|| format!("bad query count in `{part}`"))?;
        if query_len == 0 || queries == 0 {
            bail!("bench step `{part}` must have a positive length and count");
        }
        steps.push(BenchStep { query_len, queries });
    }
    if steps.is_empty() {
        bail!("empty bench plan");
    }
    Ok(steps)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchRow {
    pub step: BenchStep,
    pub average: Duration,
}

/// A loaded index plus the resources used to normalize query text.
pub struct QueryApp {
    reader: IndexReader,
    resources: Resources,
}

impl QueryApp {
    pub fn open<P: AsRef<Path>>(index_dir: P, resources: Resources) -> Result<Self> {
        let index_dir = index_dir.as_ref();
        let reader = IndexReader::open(&IndexPaths::new(index_dir))
            .with_context(|| format!("opening index at {}", index_dir.display()))?;
        let meta = reader.meta();
        tracing::info!(num_docs = meta.num_docs, num_lemmas = meta.num_lemmas, "loaded index");
        Ok(Self { reader, resources })
    }

    pub fn reader(&self) -> &IndexReader { &self.reader }

    /// Normalize comma-separated words the same way article text is and rank
    /// the documents containing them.
    pub fn search(&self, text: &str) -> Result<QueryResult> {
        let lemmas = normalize_query(&self.resources, text).context("normalizing query")?;
        tracing::debug!(?lemmas, "query lemmas");
        Ok(answer_query(&self.reader, &lemmas)?)
    }

    /// Average latency of random queries over distinct lexicon lemmas, one row per step.
    pub fn bench(&self, plan: &[BenchStep], seed: Option<u64>) -> Result<Vec<BenchRow>> {
        let lexicon: Vec<&str> = self.reader.lemmas().collect();
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut rows = Vec::with_capacity(plan.len());
        for &step in plan {
            if step.query_len > lexicon.len() {
                bail!("cannot draw {} distinct lemmas from a lexicon of {}", step.query_len, lexicon.len());
            }
            let mut elapsed = Duration::ZERO;
            for _ in 0..step.queries {
                let lemmas: Vec<String> =
                    lexicon.choose_multiple(&mut rng, step.query_len).map(|l| l.to_string()).collect();
                let start = Instant::now();
                let result = answer_query(&self.reader, &lemmas)?;
                elapsed += start.elapsed();
                tracing::trace!(?lemmas, hits = result.hits.len(), "bench query");
            }
            let average = elapsed / step.queries;
            tracing::info!(query_len = step.query_len, queries = step.queries, avg_us = average.as_micros() as u64, "bench step");
            rows.push(BenchRow { step, average });
        }
        Ok(rows)
    }
}

/// Results with a `url` column, one column per query lemma and `total_weight`.
pub fn render_table(result: &QueryResult) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    let mut titles = vec![Cell::new("url")];
    titles.extend(result.lemmas.iter().map(|l| Cell::new(l)));
    titles.push(Cell::new("total_weight"));
    table.set_titles(Row::new(titles));
    for hit in &result.hits {
        let mut cells = vec![Cell::new(&hit.document_id)];
        cells.extend(hit.lemma_weights.iter().map(|w| Cell::new(&format!("{w:.6}"))));
        cells.push(Cell::new(&format!("{:.6}", hit.total_weight)));
        table.add_row(Row::new(cells));
    }
    table
}

pub fn render_bench(rows: &[BenchRow]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["query_len", "queries", "avg_seconds"]);
    for r in rows {
        table.add_row(row![r.step.query_len, r.step.queries, format!("{:.6}", r.average.as_secs_f64())]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_plan() {
        let plan = parse_plan(DEFAULT_PLAN).unwrap();
        assert_eq!(
            plan,
            vec![
                BenchStep { query_len: 1, queries: 20 },
                BenchStep { query_len: 2, queries: 20 },
                BenchStep { query_len: 3, queries: 30 },
                BenchStep { query_len: 4, queries: 30 },
            ]
        );
    }

    #[test]
    fn rejects_bad_plans() {
        assert!(parse_plan("").is_err());
        assert!(parse_plan("3").is_err());
        assert!(parse_plan("0x5").is_err());
        assert!(parse_plan("2xmany").is_err());
        assert!(parse_plan("1x4294967296").is_err());
    }

    #[test]
    fn bench_table_has_one_row_per_step() {
        let rows = vec![BenchRow {
            step: BenchStep { query_len: 2, queries: u32::MAX },
            average: Duration::from_micros(1500),
        }];
        let table = render_bench(&rows);
        assert_eq!(table.len(), 1);
        let row = table.get_row(0).unwrap();
        assert_eq!(row.get_cell(1).unwrap().get_content(), "4294967295");
        assert_eq!(row.get_cell(2).unwrap().get_content(), "0.001500");
    }
}
