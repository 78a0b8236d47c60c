use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use core_types::Embedding;
use core_types::config::{AppConfig, EncoderKind, load_or_create_config};
use embed_index::{EmbeddingStore, StoreError, embed_and_store, recommend, search_text};
use encoder::{BoundedEncoder, Encoder, EncoderError, HashEncoder, HttpEncoder};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// StyleSearch: embed a portfolio directory and search it by text or by a
/// reference image.
#[derive(Parser, Debug)]
#[command(name = "stylesearch", version, about = "Portfolio style search over CLIP-style embeddings")]
struct Cli {
    /// Path to the TOML config (created with defaults if missing).
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed every image in a directory and persist the store.
    Embed {
        /// Image directory; defaults to `paths.images_dir` from the config.
        #[arg(short, long)]
        images_dir: Option<PathBuf>,
        /// Store file; defaults to `paths.store_path` from the config.
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Search the store with a free-text query.
    Search {
        query: String,
        /// Number of results.
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        #[arg(short, long)]
        store: Option<PathBuf>,
        /// Emit results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Recommend entries similar to a stored reference image.
    Recommend {
        /// Identifier of the reference entry (a stored filename).
        reference: String,
        /// Number of results.
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        #[arg(short, long)]
        store: Option<PathBuf>,
        /// Emit results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print a summary of the persisted store.
    Info {
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = load_or_create_config(cli.config.as_deref())?;
    init_tracing(&cfg);

    match cli.command {
        Commands::Embed { images_dir, store } => {
            let images_dir = images_dir.unwrap_or_else(|| PathBuf::from(&cfg.paths.images_dir));
            let store_path = store.unwrap_or_else(|| PathBuf::from(&cfg.paths.store_path));
            run_embed(&cfg, &images_dir, &store_path)
        }
        Commands::Search { query, k, store, json } => {
            let store = load_store(&cfg, store.as_deref())?;
            let encoder = build_encoder(&cfg)?;
            let hits = search_text(&store, encoder.as_ref(), &query, k)?;
            if hits.is_empty() {
                println!("{}", style("no results").yellow());
                return Ok(());
            }
            print_hits(&hits, json)
        }
        Commands::Recommend { reference, k, store, json } => {
            let store = load_store(&cfg, store.as_deref())?;
            let hits = recommend(&store, &reference, k)
                .with_context(|| format!("recommending entries similar to '{reference}'"))?;
            print_hits(&hits, json)
        }
        Commands::Info { store } => {
            let store = load_store(&cfg, store.as_deref())?;
            println!(
                "{} entries, dimension {}",
                store.len(),
                store
                    .dimension()
                    .map_or_else(|| "-".to_string(), |d| d.to_string())
            );
            Ok(())
        }
    }
}

fn init_tracing(cfg: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Construct the configured encoder behind the wall-clock bound.
fn build_encoder(cfg: &AppConfig) -> Result<Arc<dyn Encoder>> {
    let timeout = Duration::from_secs(cfg.encoder.timeout_secs);
    let inner: Arc<dyn Encoder> = match cfg.encoder.kind {
        EncoderKind::Hash => Arc::new(HashEncoder::new(cfg.encoder.dimension)),
        EncoderKind::Http => Arc::new(
            HttpEncoder::new(&cfg.encoder.endpoint, cfg.encoder.dimension, timeout)
                .context("constructing http encoder")?,
        ),
    };
    Ok(Arc::new(BoundedEncoder::new(inner, timeout)))
}

fn load_store(cfg: &AppConfig, store: Option<&Path>) -> Result<EmbeddingStore> {
    let path = store.map_or_else(|| PathBuf::from(&cfg.paths.store_path), Path::to_path_buf);
    match EmbeddingStore::load(&path) {
        Ok(store) => Ok(store),
        Err(err @ StoreError::NotFound { .. }) => Err(err).with_context(|| {
            format!(
                "no store at {}; run `stylesearch embed` first",
                path.display()
            )
        }),
        Err(err) => Err(err).with_context(|| format!("loading store at {}", path.display())),
    }
}

fn run_embed(cfg: &AppConfig, images_dir: &Path, store_path: &Path) -> Result<()> {
    let total = std::fs::read_dir(images_dir)
        .with_context(|| format!("reading image directory {}", images_dir.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .count() as u64;

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("progress bar template")?,
    );

    let encoder = ProgressEncoder {
        inner: build_encoder(cfg)?,
        bar: bar.clone(),
    };
    let (store, report) = embed_and_store(&encoder, images_dir, store_path)?;
    bar.finish_and_clear();

    println!(
        "{} {} embedded, {} skipped -> {}",
        style("done:").green(),
        report.processed,
        report.skipped.len(),
        store_path.display()
    );
    if !report.skipped.is_empty() {
        println!("{}", style("skipped:").yellow());
        for identifier in &report.skipped {
            println!("  {identifier}");
        }
    }
    tracing::info!(
        entries = store.len(),
        store = %store_path.display(),
        "store rebuilt"
    );
    Ok(())
}

fn print_hits(hits: &[core_types::SearchHit], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. {:<44} {}",
            rank + 1,
            hit.identifier,
            style(format!("{:.4}", hit.score)).cyan()
        );
    }
    Ok(())
}

/// Ticks the progress bar as the wrapped encoder works through images.
struct ProgressEncoder {
    inner: Arc<dyn Encoder>,
    bar: ProgressBar,
}

impl Encoder for ProgressEncoder {
    fn encode_image(&self, path: &Path) -> std::result::Result<Embedding, EncoderError> {
        let result = self.inner.encode_image(path);
        self.bar.inc(1);
        result
    }

    fn encode_text(&self, text: &str) -> std::result::Result<Embedding, EncoderError> {
        self.inner.encode_text(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
