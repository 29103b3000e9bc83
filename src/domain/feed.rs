use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Id of the user who first added the feed.
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stamped when the scheduler claims the feed, not when a fetch succeeds.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl Feed {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// A feed joined with the name of the user that created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedWithCreator {
    pub feed: Feed,
    pub creator_name: String,
}
