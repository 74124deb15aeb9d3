use crate::types::{PublishReceipt, PublishRequest, RawFeed, Result};
use async_trait::async_trait;

/// Supplies one parsed feed per pull (RSS feeds, fixtures, etc.)
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Identifier used in log lines
    fn source_id(&self) -> String;

    async fn pull(&self) -> Result<RawFeed>;
}

/// Posts a single item to a social platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt>;
}
