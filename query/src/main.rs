use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use newsindex_core::config::Settings;
use newsindex_core::Resources;
use query::{parse_plan, render_bench, render_table, QueryApp, DEFAULT_PLAN};
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Search the weighted lemma index", long_about = None)]
struct Args {
    /// JSON settings file (defaults to $NEWSINDEX_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index directory path
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank articles for comma-separated words; reads one line from stdin when TEXT is omitted
    Search { text: Option<String> },
    /// Time random queries drawn from the index lexicon
    Bench {
        /// Comma-separated LENxCOUNT steps
        #[arg(long, default_value = DEFAULT_PLAN)]
        plan: String,
        /// Seed for reproducible query sampling
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn read_query_line() -> Result<String> {
    eprint!("Enter comma-separated words: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).context("reading query from stdin")?;
    Ok(line)
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();
    let mut settings = Settings::resolve(args.config.as_deref()).context("loading settings")?;
    if let Some(dir) = args.index {
        settings.index_dir = dir;
    }
    let resources = Resources::load(&settings.resources).context("loading linguistic resources")?;
    let app = QueryApp::open(&settings.index_dir, resources)?;

    match args.command {
        Commands::Search { text } => {
            let text = match text {
                Some(text) => text,
                None => read_query_line()?,
            };
            let result = app.search(&text)?;
            if result.is_empty() {
                tracing::info!(query = %text.trim(), "no matching articles");
            }
            render_table(&result).printstd();
        }
        Commands::Bench { plan, seed } => {
            let plan = parse_plan(&plan)?;
            let rows = app.bench(&plan, seed)?;
            render_bench(&rows).printstd();
        }
    }
    Ok(())
}
