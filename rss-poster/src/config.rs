use crate::types::{FetchConfig, PosterError, Result};
use crate::window::RunWindow;
use clap::{ArgAction, Parser};
use std::time::Duration;

/// Command line and environment inputs for one run.
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-poster", about = "Republish recent RSS items as Bluesky posts")]
pub struct Cli {
    /// Run the whole pipeline without posting
    #[arg(short = 'd', long = "dry-run", alias = "dryRun", default_value_t = true, action = ArgAction::Set)]
    pub dry_run: bool,

    /// The number of hours to look back
    #[arg(
        short = 'l',
        long = "look-back-period",
        alias = "lookBackPeriod",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub look_back_period: i64,

    /// Fixed current time, e.g. 2024-01-01T10:30:00Z
    #[arg(short = 't', long = "current-time", alias = "currentTime")]
    pub current_time: Option<String>,

    /// Comma separated feed URLs
    #[arg(long, env = "FEED_URLS", value_delimiter = ',')]
    pub feed_urls: Vec<String>,

    /// Seconds to wait between two posts
    #[arg(long, env = "PUBLISH_DELAY_SECS", default_value_t = 2)]
    pub publish_delay_secs: u64,

    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[arg(long, env = "BSKY_USERNAME")]
    pub bsky_username: Option<String>,

    #[arg(long, env = "BSKY_PASSWORD", hide_env_values = true)]
    pub bsky_password: Option<String>,

    #[arg(long, env = "BSKY_SERVICE", default_value = "https://bsky.social")]
    pub bsky_service: String,

    #[arg(long, default_value = "RSS-Poster/1.0")]
    pub user_agent: String,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BlueskyConfig {
    pub service: String,
    pub credentials: Credentials,
}

/// Everything a run needs, resolved and validated up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub feed_urls: Vec<String>,
    pub window: RunWindow,
    pub dry_run: bool,
    pub publish_delay: Duration,
    pub fetch: FetchConfig,
    /// Present for live runs only.
    pub bluesky: Option<BlueskyConfig>,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let window = RunWindow::derive(cli.current_time.as_deref(), cli.look_back_period)?;

        let feed_urls: Vec<String> = cli
            .feed_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();

        let bluesky = if cli.dry_run {
            None
        } else {
            match (cli.bsky_username, cli.bsky_password) {
                (Some(identifier), Some(password)) if !identifier.is_empty() && !password.is_empty() => {
                    Some(BlueskyConfig {
                        service: cli.bsky_service,
                        credentials: Credentials { identifier, password },
                    })
                }
                _ => {
                    return Err(PosterError::Configuration(
                        "BSKY_USERNAME and BSKY_PASSWORD are required for a live run".to_string(),
                    ))
                }
            }
        };

        Ok(Self {
            feed_urls,
            window,
            dry_run: cli.dry_run,
            publish_delay: Duration::from_secs(cli.publish_delay_secs),
            fetch: FetchConfig {
                user_agent: cli.user_agent,
                timeout_seconds: cli.timeout_secs,
                ..FetchConfig::default()
            },
            bluesky,
        })
    }
}
