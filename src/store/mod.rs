pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Feed, FeedWithCreator, FollowView, User};

pub use sqlite::SqliteStore;

/// Persistence operations the follow graph and the scheduler rely on.
pub trait Store {
    // User operations
    fn create_user(&self, name: &str) -> Result<User>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    /// Delete every user. Feeds and follows go with them.
    fn reset(&self) -> Result<()>;

    // Feed operations
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    fn create_feed(&self, name: &str, url: &str, creator_id: i64) -> Result<Feed>;
    fn list_feeds_with_creators(&self) -> Result<Vec<FeedWithCreator>>;

    /// Pick the feed with the oldest (or no) `last_fetched_at` and stamp it
    /// in the same transaction. The stamp is `now`, or one microsecond past
    /// the newest stamp in the table when the clock has not moved beyond it,
    /// so the claimed feed always goes to the back of the rotation.
    ///
    /// Returns [`GatorError::NoFeedsAvailable`](crate::app::GatorError::NoFeedsAvailable)
    /// when there are no feeds.
    fn claim_next_feed(&self, now: DateTime<Utc>) -> Result<Feed>;

    // Follow operations
    fn create_follow(&self, user_id: i64, feed_id: i64) -> Result<FollowView>;
    /// Returns whether a follow was removed. Missing follows are not an error.
    fn delete_follow(&self, user_id: i64, feed_id: i64) -> Result<bool>;
    fn list_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowView>>;
}
