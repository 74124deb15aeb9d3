pub mod types;
pub mod validator;
pub mod item;
pub mod window;
pub mod reconciler;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod sources;
pub mod facets;
pub mod bluesky;
pub mod pipeline;

pub use types::*;
pub use item::Item;
pub use window::RunWindow;
pub use reconciler::Reconciler;
pub use config::{Cli, RunConfig};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::{FeedSource, Publisher};
pub use sources::RssFeedSource;
pub use bluesky::BlueskyClient;
