pub mod document;
pub mod feed;
pub mod follow;
pub mod user;

pub use document::{Channel, FeedDocument, FeedItem};
pub use feed::{Feed, FeedWithCreator};
pub use follow::FollowView;
pub use user::User;
