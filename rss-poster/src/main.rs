use clap::Parser;
use rss_poster::pipeline;
use rss_poster::{BlueskyClient, Cli, FeedSource, Fetcher, Publisher, RssFeedSource, RunConfig};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = RunConfig::from_cli(cli).map_err(|e| {
        error!("Refusing to start: {}", e);
        e
    })?;

    info!("Starting RSS poster ({})", if config.dry_run { "DRY RUN" } else { "LIVE" });
    debug!("Urls: {}", config.feed_urls.join(","));

    let fetcher = Fetcher::new(&config.fetch)?;
    let sources: Vec<Box<dyn FeedSource>> = RssFeedSource::from_urls(&config.feed_urls, &fetcher)
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn FeedSource>)
        .collect();

    let client = match &config.bluesky {
        Some(bluesky) => Some(BlueskyClient::login(bluesky, &config.fetch).await?),
        None => None,
    };
    let publisher = client.as_ref().map(|c| c as &dyn Publisher);

    let report = pipeline::run(&config, &sources, publisher).await;
    if let Some(summary) = report.publish {
        if summary.failed > 0 {
            error!("{} of {} posts failed", summary.failed, summary.attempted);
        }
    }

    info!("RSS poster finished");
    Ok(())
}
