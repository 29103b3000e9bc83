pub mod http_fetcher;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedDocument;

pub use http_fetcher::HttpFetcher;

/// Retrieves and parses a single feed. Implementations never retry.
#[async_trait]
pub trait Fetcher {
    /// Fetch `url`, giving up once `deadline` has elapsed.
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<FeedDocument>;
}
