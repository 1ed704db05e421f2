use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mediadex_core::config::{resolve_with_base, Config, Settings};
use mediadex_index::{IndexOptions, MediaIndex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mediadex")]
#[command(about = "Index and search a local audio library", long_about = None)]
#[command(version)]
struct Cli {
    /// Index directory; defaults to `index.name` from config
    #[arg(long, global = true)]
    index: Option<String>,
    /// Debug logging, no progress spinner
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage and search an index
    #[command(subcommand)]
    Index(IndexCommand),
}

#[derive(Subcommand)]
enum IndexCommand {
    /// Crawl roots and build a new index
    Create {
        #[arg(required = true)]
        roots: Vec<String>,
        /// Replace an existing index at the same location
        #[arg(long)]
        overwrite: bool,
    },
    /// Search the index; terms are joined with spaces
    Query {
        #[arg(required = true)]
        terms: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the file behind a document id
    Path { id: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Config::load()
        .and_then(|c| c.settings())
        .map_err(|e| {
            eprintln!("Error loading config: {}", e);
            e
        })?;
    let cwd = std::env::current_dir()?;
    let index_path = resolve_with_base(&cwd, cli.index.as_deref().unwrap_or(&settings.index.name));

    match cli.command {
        Commands::Index(IndexCommand::Create { roots, overwrite }) => {
            let roots: Vec<PathBuf> = roots.iter().map(|r| resolve_with_base(&cwd, r)).collect();
            create(&settings, roots, index_path, overwrite, cli.verbose).await
        }
        Commands::Index(IndexCommand::Query { terms, json }) => {
            let index = MediaIndex::open(&index_path, IndexOptions::from(&settings.index))?;
            let files = index.query(&terms.join(" "))?;
            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &files)?;
                writeln!(out)?;
            } else {
                files.write_out(&mut out)?;
                writeln!(out, "Total: {} found.", files.len())?;
            }
            Ok(())
        }
        Commands::Index(IndexCommand::Path { id }) => {
            let index = MediaIndex::open(&index_path, IndexOptions::from(&settings.index))?;
            match index.path_for_id(&id)? {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => bail!("unable to find media {}", id),
            }
        }
    }
}

async fn create(settings: &Settings, roots: Vec<PathBuf>, index_path: PathBuf, overwrite: bool, verbose: bool) -> anyhow::Result<()> {
    let spinner = if verbose { ProgressBar::hidden() } else { ProgressBar::new_spinner() };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = mediadex_pipeline::ingest(settings, roots, &index_path, overwrite, |p| {
        spinner.set_position(p.emitted as u64);
        spinner.set_message(p.current.display().to_string());
    })
    .await
    .with_context(|| format!("creating index {}", index_path.display()));
    spinner.finish_and_clear();
    let report = report?;

    for root in &report.crawl.failed_roots {
        eprintln!("skipped root {}", root.display());
    }
    println!("Index created, documents: {}", report.documents);
    Ok(())
}
