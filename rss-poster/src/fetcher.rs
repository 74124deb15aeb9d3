use crate::types::{FetchConfig, PosterError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Client shared by feed downloads and the Bluesky API: user agent, timeout,
/// compression and a redirect limit from `config`.
pub fn http_client(config: &FetchConfig) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?)
}

/// Downloads feed documents. One attempt per call; failures go back to the caller.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
        })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let url = Url::parse(url)?;

        debug!("Fetching feed: {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PosterError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content = response.text().await?;
        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}
