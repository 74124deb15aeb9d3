use crate::config::RunConfig;
use crate::item::Item;
use crate::reconciler::Reconciler;
use crate::traits::{FeedSource, Publisher};
use crate::types::PublishRequest;
use crate::window::RunWindow;
use std::time::Duration;
use tracing::{debug, error, info};

/// Counters for the collection half of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub entries_rejected: usize,
    pub entries_out_of_window: usize,
    pub unique_items: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub attempted: usize,
    pub published: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub queue: Vec<Item>,
    /// `None` for dry runs.
    pub publish: Option<PublishSummary>,
}

/// Pulls every source in order and reconciles the results into a publish queue.
///
/// Sources are scanned one after another so the merge sees a single, ordered
/// stream of feeds. A source that fails is logged and skipped.
pub async fn collect(window: RunWindow, sources: &[Box<dyn FeedSource>]) -> (Vec<Item>, RunStats) {
    let mut reconciler = Reconciler::new(window);
    let mut stats = RunStats::default();

    for source in sources {
        let feed = match source.pull().await {
            Ok(feed) => feed,
            Err(e) => {
                error!("Failed to read feed {}: {}", source.source_id(), e);
                stats.feeds_failed += 1;
                continue;
            }
        };

        debug!("Title: {}", feed.title.as_deref().unwrap_or_default());
        let ingest = reconciler.ingest(&feed);
        stats.feeds_ok += 1;
        stats.entries_seen += ingest.seen;
        stats.entries_rejected += ingest.rejected;
        stats.entries_out_of_window += ingest.out_of_window;
    }

    stats.unique_items = reconciler.len();
    (reconciler.into_publish_queue(), stats)
}

/// Publishes items in order, pausing `delay` between consecutive posts.
pub async fn publish_all(items: &[Item], publisher: &dyn Publisher, delay: Duration) -> PublishSummary {
    let mut summary = PublishSummary::default();

    for (i, item) in items.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        debug!("[LIVE] Posting item: {}", item);
        summary.attempted += 1;
        match publisher.publish(&PublishRequest::from(item)).await {
            Ok(_) => summary.published += 1,
            Err(e) => {
                error!("Error posting '{}' to Bluesky: {}", item.title, e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// One complete run. `publisher` is only consulted when the run is live.
pub async fn run(
    config: &RunConfig,
    sources: &[Box<dyn FeedSource>],
    publisher: Option<&dyn Publisher>,
) -> RunReport {
    info!(
        "Finding feed items with publication date between: {}",
        config.window
    );

    let (queue, stats) = collect(config.window, sources).await;
    info!(
        "Collected {} unique items from {} feeds ({} failed, {} entries rejected, {} outside window)",
        stats.unique_items, stats.feeds_ok, stats.feeds_failed, stats.entries_rejected, stats.entries_out_of_window
    );

    let publish = match publisher.filter(|_| !config.dry_run) {
        Some(publisher) => {
            info!("[LIVE] Posting items: {}", queue.len());
            let summary = publish_all(&queue, publisher, config.publish_delay).await;
            info!(
                "[LIVE] Posted {} of {} items ({} failed)",
                summary.published, summary.attempted, summary.failed
            );
            Some(summary)
        }
        None => {
            info!("[DRY RUN] Posting items: {}", queue.len());
            for item in &queue {
                debug!("[DRY RUN] Posting item: {}", item);
            }
            None
        }
    };

    RunReport {
        stats,
        queue,
        publish,
    }
}
