use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use newsindex_core::config::Settings;
use newsindex_core::pipeline::{run_build, run_stage, Stage};
use newsindex_core::Resources;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the weighted lemma index of crawled news articles", long_about = None)]
struct Cli {
    /// JSON settings file (defaults to $NEWSINDEX_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory of crawled *.jsonl / *.json articles
    #[arg(long, global = true)]
    articles: Option<PathBuf>,
    /// Record store directory
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Output index directory
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage: ingest, tag, clean, count, weight
    Build,
    /// Load the article files into the record store
    Ingest,
    /// Split and part-of-speech tag every stored article
    Tag,
    /// Keep lowercased open-class, non-stopword tokens
    Clean,
    /// Lemmatize the cleaned tokens and count lemmas per article
    Count,
    /// Compute TF-IDF weights and write the index
    Weight,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::resolve(self.config.as_deref()).context("loading settings")?;
        if let Some(dir) = &self.articles {
            settings.articles_dir = dir.clone();
        }
        if let Some(dir) = &self.store {
            settings.store_dir = dir.clone();
        }
        if let Some(dir) = &self.index {
            settings.index_dir = dir.clone();
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let settings = cli.settings()?;
    let resources = Resources::load(&settings.resources).context("loading linguistic resources")?;

    let stage = match cli.command {
        Commands::Build => {
            let report = run_build(&settings, &resources)
                .with_context(|| format!("building index from {}", settings.articles_dir.display()))?;
            tracing::info!(
                documents = report.documents,
                lemmas = report.lemmas,
                postings = report.postings,
                output = %settings.index_dir.display(),
                "index build complete"
            );
            println!("Inverted index build time: {:.3} seconds", report.elapsed.as_secs_f64());
            return Ok(());
        }
        Commands::Ingest => Stage::Ingest,
        Commands::Tag => Stage::Tag,
        Commands::Clean => Stage::Clean,
        Commands::Count => Stage::Count,
        Commands::Weight => Stage::Weight,
    };
    run_stage(stage, &settings, &resources).with_context(|| format!("running stage `{stage}`"))?;
    Ok(())
}
