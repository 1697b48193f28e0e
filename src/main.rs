//! # guidetag CLI Application
//!
//! Command-line access to the guidetag library.
//!
//! ## Subcommands
//!
//! - `fetch`: print the advisory record for an identifier as JSON
//! - `classify`: print the category tags for an identifier
//! - `tag`: run the tagging pipeline over a JSON list of catalog items
//! - `purge`: remove stale cache entries
//!
//! Logging goes to stderr, filtered by `RUST_LOG`. Ctrl-C cancels a running
//! command cleanly.

mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use guidetag::advisory::AdvisoryRecord;
use guidetag::cache::AdvisoryCache;
use guidetag::cancel::{CancelHandle, CancelToken};
use guidetag::classifier::Classifier;
use guidetag::config::{Settings, TaggerConfig};
use guidetag::fetcher::{AdvisoryFetcher, FetchOutcome, ImdbSource};
use guidetag::identifier::{AdvisoryId, normalize};
use guidetag::pipeline::{CatalogItem, MemoryStore, Tagger};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Tag media items with nudity and sexual content advisories", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory, overriding the configuration
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,

    /// Also write logs to guidetag.log in this directory
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the advisory record for an identifier
    Fetch(FetchArgs),

    /// Print the category tags for an identifier
    Classify(ClassifyArgs),

    /// Tag a JSON list of catalog items
    Tag(TagArgs),

    /// Remove cache entries older than twice the cache duration
    Purge,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Advisory identifier, with or without the tt prefix
    #[arg(required = true)]
    id: String,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Advisory identifier, with or without the tt prefix
    #[arg(required = true)]
    id: String,

    /// Lowest severity to tag (None, Mild, Moderate, Severe)
    #[arg(short, long)]
    min_severity: Option<String>,

    /// Prefix for every tag
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Args, Debug)]
struct TagArgs {
    /// JSON file holding an array of catalog items
    #[arg(required = true)]
    items: PathBuf,

    /// Where to write the updated items (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.global.log_file.as_deref(), cli.global.otel)?;

    let handle = CancelHandle::new();
    let cancel = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            handle.cancel();
        }
    });

    match cli.command {
        Commands::Fetch(args) => {
            let settings = load_settings(&cli.global, |_| {}).await?;
            fetch_command(args, settings, cancel).await?;
        }
        Commands::Classify(args) => {
            let settings = load_settings(&cli.global, |config| {
                if let Some(min) = &args.min_severity {
                    config.minimum_severity_to_tag = min.clone();
                }
                if let Some(prefix) = &args.prefix {
                    config.tag_prefix = prefix.clone();
                }
            })
            .await?;
            classify_command(args, settings, cancel).await?;
        }
        Commands::Tag(args) => {
            let settings = load_settings(&cli.global, |_| {}).await?;
            tag_command(args, settings, cancel).await?;
        }
        Commands::Purge => {
            let settings = load_settings(&cli.global, |_| {}).await?;
            purge_command(settings).await?;
        }
    }

    Ok(())
}

/// Configuration file (or defaults) with command-line overrides, validated
async fn load_settings(
    global: &GlobalArgs,
    overrides: impl FnOnce(&mut TaggerConfig),
) -> anyhow::Result<Settings> {
    let mut config = match &global.config {
        Some(path) => TaggerConfig::from_file(path).await?,
        None => TaggerConfig::default(),
    };
    if let Some(dir) = &global.cache_dir {
        config.cache_directory = dir.clone();
    }
    overrides(&mut config);
    Ok(config.validate())
}

fn build_fetcher(settings: &Settings) -> anyhow::Result<AdvisoryFetcher<ImdbSource>> {
    let source = ImdbSource::new()?;
    let cache = AdvisoryCache::new(settings.cache_config());
    Ok(AdvisoryFetcher::new(source, cache, settings.fetcher_config()))
}

async fn fetch_record(
    fetcher: &AdvisoryFetcher<ImdbSource>,
    id: &AdvisoryId,
    cancel: &CancelToken,
) -> anyhow::Result<AdvisoryRecord> {
    let fetched = fetcher.fetch(id, cancel).await?;
    info!("Advisory for {} served from {:?}", id, fetched.origin);
    match fetched.outcome {
        FetchOutcome::Found(record) => Ok(record),
        FetchOutcome::NotFound => Err(anyhow!("No advisory page exists for {}", id)),
    }
}

#[instrument(skip(settings, cancel))]
async fn fetch_command(args: FetchArgs, settings: Settings, cancel: CancelToken) -> anyhow::Result<()> {
    let id = normalize(&args.id)?;
    let fetcher = build_fetcher(&settings)?;
    let record = fetch_record(&fetcher, &id, &cancel).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

#[instrument(skip(settings, cancel))]
async fn classify_command(args: ClassifyArgs, settings: Settings, cancel: CancelToken) -> anyhow::Result<()> {
    let id = normalize(&args.id)?;
    let fetcher = build_fetcher(&settings)?;
    let record = fetch_record(&fetcher, &id, &cancel).await?;

    let classifier = Classifier::new(&settings.keywords);
    let signals = classifier.signals(&record.descriptions);
    let tags = classifier.classify(&record, settings.min_severity, &settings.tag_prefix);

    println!("{} severity: {}", id, record.severity);
    println!("Signals: {:?}", signals);
    if tags.is_empty() {
        println!("No tags at threshold {}", settings.min_severity);
    }
    for tag in tags {
        println!("{}", tag);
    }
    Ok(())
}

async fn read_items(path: &Path) -> anyhow::Result<Vec<CatalogItem>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid item list in {}", path.display()))
}

async fn write_items(items: &[CatalogItem], output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            println!("Saved updated items to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[instrument(skip(settings, cancel))]
async fn tag_command(args: TagArgs, settings: Settings, cancel: CancelToken) -> anyhow::Result<()> {
    let mut items = read_items(&args.items).await?;
    let fetcher = build_fetcher(&settings)?;
    let mut tagger = Tagger::new(fetcher, MemoryStore::new(), settings, cancel);

    let progress_bar = ProgressBar::new(items.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Tagging items...");

    let result = tagger
        .run(&mut items, |done, _total| progress_bar.set_position(done as u64))
        .await;

    let summary = match result {
        Ok(summary) => {
            progress_bar.finish_with_message("Done");
            summary
        }
        Err(cancelled) => {
            progress_bar.abandon_with_message("Cancelled");
            // Keep what was tagged before the interrupt
            write_items(&items, args.output.as_deref()).await?;
            return Err(cancelled.into());
        }
    };

    write_items(&items, args.output.as_deref()).await?;
    eprintln!(
        "Processed: {}, Tagged: {}, Skipped: {}, Failed: {} ({} items persisted)",
        summary.processed,
        summary.tagged,
        summary.skipped,
        summary.failed,
        tagger.store().items().len()
    );
    Ok(())
}

#[instrument(skip(settings))]
async fn purge_command(settings: Settings) -> anyhow::Result<()> {
    let cache = AdvisoryCache::new(settings.cache_config());
    let cutoff = cache.cleanup_cutoff();
    let report = cache.purge_older_than(cutoff).await?;

    println!(
        "Removed {} cache entries older than {} ({} failed)",
        report.removed,
        cutoff.to_rfc3339(),
        report.failed
    );
    Ok(())
}
