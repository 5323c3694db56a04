use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use tracing::info;
use tracing_subscriber::EnvFilter;

use source_metadata::{MetadataCache, MetadataConfig};

#[derive(Parser)]
#[command(name = "source-meta", about = "Resolve titles and favicons for cited source URLs")]
struct Cli {
    /// URLs or document references to resolve. Duplicates are fetched once.
    #[arg(required = true)]
    urls: Vec<String>,

    /// Request timeout in seconds (overrides SOURCE_META_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print each JSON result
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("source_metadata=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = MetadataConfig::from_env();
    if let Some(secs) = cli.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }

    let cache = MetadataCache::from_config(&config).context("Failed to build metadata cache")?;

    for url in &cli.urls {
        cache.prefetch(url);
    }
    let entries = join_all(cli.urls.iter().map(|url| cache.resolve(url))).await;

    for (url, entry) in cli.urls.iter().zip(entries) {
        let record = serde_json::json!({ "url": url, "metadata": entry });
        let line = if cli.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        println!("{line}");
    }

    info!(
        urls = cli.urls.len(),
        distinct = cache.len(),
        mutations = cache.coalescer().mutations(),
        signals = cache.coalescer().signals(),
        "Resolution complete"
    );

    Ok(())
}
