mod config;
mod embeddings;
mod error;
mod graph;
mod logging;
mod pipeline;
mod record;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::pipeline::RunContext;
use crate::settings::{Settings, SettingsArgs};

/// Load patent JSON documents into a property graph with embedded text chunks.
#[derive(Debug, Parser)]
#[command(name = "patent-graph", version = config::VERSION)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Directory for log files (default ~/.patent-graph/logs)
    #[arg(long, env = "PATENT_GRAPH_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest every *.json patent document in a directory
    Ingest {
        dir: PathBuf,
        /// Stop after this many files
        #[arg(long)]
        max_files: Option<usize>,
    },
    /// Evidence chunks most similar to a patent's first chunk
    Similar {
        application_number: String,
        #[arg(long, default_value_t = config::search::DEFAULT_TOP_K, allow_negative_numbers = true)]
        top_k: i64,
    },
    /// Node and relationship counts
    Stats,
}

fn main() {
    // A missing .env is normal; a malformed one is not.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("[patent-graph] fatal error: invalid .env: {e}");
            std::process::exit(1);
        }
    }
    let cli = Cli::parse();

    if let Err(e) = real_main(cli) {
        eprintln!("[patent-graph] fatal error: {e:?}");
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    logging::init_logging(cli.log_dir.as_deref())?;

    let settings = Settings::from_args(&cli.settings)?;
    log::info!(
        "Settings: backend={:?} embedder={:?} dims={} chunk={}/{} batch={}",
        cli.settings.backend,
        cli.settings.embedder,
        settings.dimensions,
        settings.chunk.size(),
        settings.chunk.overlap(),
        settings.batch_size
    );

    match cli.command {
        Command::Ingest { dir, max_files } => {
            let embedder = settings.build_embedder().context("initialize embedding provider")?;
            let store = settings.open_store()?;
            let mut ctx = RunContext::new(store, Some(embedder));

            // Close the store even when the directory is unusable.
            let outcome = ctx.ingest_dir(&dir, max_files).map(|_| ());
            let stats = ctx.finish()?;
            outcome?;
            print_json(&serde_json::to_value(&stats)?)
        }
        Command::Similar { application_number, top_k } => {
            let mut ctx = RunContext::new(settings.open_store()?, None);
            let outcome = ctx.find_similar_evidence(&application_number, top_k);
            ctx.finish()?;
            let hits = outcome?;
            print_json(&json!({
                "application_number": application_number,
                "top_k": top_k,
                "results": hits,
            }))
        }
        Command::Stats => {
            let store = settings.open_store()?;
            let backend = store.backend();
            let mut ctx = RunContext::new(store, None);
            let outcome = ctx.graph_stats();
            ctx.finish()?;
            let stats = outcome?;
            print_json(&json!({
                "backend": backend,
                "nodes": stats.nodes,
                "relationships": stats.relationships,
            }))
        }
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}
