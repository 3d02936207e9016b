//! Sumi-Courier main entry point
//!
//! This is the command-line interface for the Sumi-Courier fetch scheduler.

use anyhow::{bail, Context};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_courier::config::{load_config_with_hash, Config};
use sumi_courier::url::cache_identity;
use sumi_courier::{FetchRequest, MemoryStore, Scheduler};
use tracing_subscriber::EnvFilter;

/// Sumi-Courier: a polite, single-lane page fetcher
///
/// Fetches the given URLs one at a time, waiting at least the configured delay
/// between requests, following redirects, and reporting what came back.
#[derive(Parser, Debug)]
#[command(name = "sumi-courier")]
#[command(version = "1.0.0")]
#[command(about = "A polite, single-lane page fetcher", long_about = None)]
struct Cli {
    /// URLs to fetch, dispatched in the order given
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the delay between requests (milliseconds)
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Parse each page and print its title
    #[arg(long)]
    document: bool,

    /// Cache pages in memory; repeated URLs are fetched after the first and
    /// served from the cache
    #[arg(long)]
    memory_cache: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// One line of the fetch report
struct Outcome {
    url: String,
    result: Result<Summary, String>,
}

struct Summary {
    content_type: String,
    length: usize,
    from_cache: bool,
    title: Option<String>,
}

// Spawned tasks on a current-thread runtime are first polled in spawn order,
// which keeps the queue order equal to the argument order.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(delay) = cli.delay {
        config.request.delay_ms = delay;
    }

    let mut builder = Scheduler::builder(config);
    if cli.memory_cache {
        builder = builder.store(Arc::new(MemoryStore::new()));
    }
    let scheduler = Arc::new(builder.build().context("failed to build scheduler")?);

    tracing::info!("Fetching {} URLs", cli.urls.len());

    let outcomes = fetch_all(scheduler, &cli.urls, cli.document, cli.memory_cache).await?;

    let mut failures = 0;
    for outcome in &outcomes {
        if outcome.result.is_err() {
            failures += 1;
        }
        if !cli.quiet || outcome.result.is_err() {
            print_outcome(outcome);
        }
    }

    if failures > 0 {
        bail!("{} of {} fetches failed", failures, cli.urls.len());
    }

    Ok(())
}

/// Fetches every URL, returning outcomes in argument order
///
/// Distinct URLs are queued together. With `defer_repeats`, a URL seen
/// earlier in the list is only submitted once all distinct URLs finished, so
/// it is answered by the cache whenever the first fetch was cacheable.
async fn fetch_all(
    scheduler: Arc<Scheduler>,
    urls: &[String],
    want_document: bool,
    defer_repeats: bool,
) -> anyhow::Result<Vec<Outcome>> {
    let (first, repeats) = if defer_repeats {
        split_repeats(urls)
    } else {
        ((0..urls.len()).collect(), Vec::new())
    };

    let mut outcomes: Vec<Option<Outcome>> = (0..urls.len()).map(|_| None).collect();

    let handles: Vec<_> = first
        .iter()
        .map(|&index| {
            let scheduler = scheduler.clone();
            let url = urls[index].clone();
            let handle =
                tokio::spawn(async move { fetch_one(&scheduler, url, want_document).await });
            (index, handle)
        })
        .collect();

    for (index, handle) in handles {
        outcomes[index] = Some(handle.await.context("fetch task panicked")?);
    }

    for index in repeats {
        tracing::debug!("Repeated URL, fetching after the first: {}", urls[index]);
        outcomes[index] = Some(fetch_one(&scheduler, urls[index].clone(), want_document).await);
    }

    Ok(outcomes.into_iter().flatten().collect())
}

/// Splits argument positions into first occurrences and repeats
///
/// URLs are compared by cache identity, so `http://a.com/x#top` repeats
/// `http://a.com/x`.
fn split_repeats(urls: &[String]) -> (Vec<usize>, Vec<usize>) {
    let mut seen = HashSet::new();
    let mut first = Vec::new();
    let mut repeats = Vec::new();

    for (index, url) in urls.iter().enumerate() {
        if seen.insert(cache_identity(url)) {
            first.push(index);
        } else {
            repeats.push(index);
        }
    }

    (first, repeats)
}

/// Fetches one URL and reduces the response to what gets printed
async fn fetch_one(scheduler: &Scheduler, url: String, want_document: bool) -> Outcome {
    let mut request = FetchRequest::new(url.clone());
    request.want_document = want_document;

    let result = scheduler
        .submit(request)
        .await
        .map(|response| Summary {
            title: response.title(),
            content_type: response.content_type,
            length: response.body.len(),
            from_cache: response.from_cache,
        })
        .map_err(|e| e.to_string());

    Outcome { url, result }
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.result {
        Ok(summary) => {
            let source = if summary.from_cache { "cache" } else { "network" };
            let content_type = if summary.content_type.is_empty() {
                "-"
            } else {
                summary.content_type.as_str()
            };
            print!(
                "✓ {} [{}] {} bytes ({})",
                outcome.url, content_type, summary.length, source
            );
            if let Some(title) = &summary.title {
                print!(" \"{}\"", title);
            }
            println!();
        }
        Err(e) => eprintln!("✗ {}: {}", outcome.url, e),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_courier=info,warn"),
            1 => EnvFilter::new("sumi_courier=debug,info"),
            2 => EnvFilter::new("sumi_courier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
