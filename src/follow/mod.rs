//! User ↔ feed subscriptions.
//!
//! Every operation takes the acting [`User`] explicitly; nothing here reads
//! the session itself.

use url::Url;

use crate::app::{GatorError, Result};
use crate::domain::{Feed, FeedWithCreator, FollowView, User};
use crate::store::Store;

/// A feed the user follows, as shown by `following`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedFeed {
    pub name: String,
    pub url: String,
}

/// Find the feed at `url`, creating it with `user` as creator if needed, and
/// follow it.
pub fn add_feed_and_follow<S: Store + ?Sized>(
    store: &S,
    name: &str,
    url: &str,
    user: &User,
) -> Result<(Feed, FollowView)> {
    let name = require_arg(name, "feed name")?;
    let url = validate_feed_url(url)?;

    let feed = match store.get_feed_by_url(url)? {
        Some(feed) => feed,
        None => match store.create_feed(name, url, user.id) {
            Ok(feed) => {
                tracing::info!("Created feed '{}' ({})", feed.name, feed.url);
                feed
            }
            // Someone else added it between the lookup and the insert.
            Err(GatorError::Conflict(_)) => store
                .get_feed_by_url(url)?
                .ok_or_else(|| GatorError::NotFound(format!("feed '{}'", url)))?,
            Err(e) => return Err(e),
        },
    };

    let follow = store.create_follow(user.id, feed.id)?;
    Ok((feed, follow))
}

/// Follow an existing feed. Unlike [`add_feed_and_follow`] this never
/// creates the feed.
pub fn follow<S: Store + ?Sized>(store: &S, url: &str, user: &User) -> Result<FollowView> {
    let feed = existing_feed(store, url)?;
    store.create_follow(user.id, feed.id)
}

/// Stop following the feed at `url`. Returns whether a follow was removed;
/// unfollowing a feed the user does not follow is not an error.
pub fn unfollow<S: Store + ?Sized>(store: &S, url: &str, user: &User) -> Result<bool> {
    let feed = existing_feed(store, url)?;
    let removed = store.delete_follow(user.id, feed.id)?;
    if !removed {
        tracing::debug!("User '{}' was not following {}", user.name, feed.url);
    }
    Ok(removed)
}

pub fn list_follows<S: Store + ?Sized>(store: &S, user: &User) -> Result<Vec<FollowedFeed>> {
    let follows = store.list_follows_for_user(user.id)?;
    Ok(follows
        .into_iter()
        .map(|f| FollowedFeed {
            name: f.feed_name,
            url: f.feed_url,
        })
        .collect())
}

pub fn list_all_feeds<S: Store + ?Sized>(store: &S) -> Result<Vec<FeedWithCreator>> {
    store.list_feeds_with_creators()
}

fn existing_feed<S: Store + ?Sized>(store: &S, url: &str) -> Result<Feed> {
    let url = require_arg(url, "feed URL")?;
    store
        .get_feed_by_url(url)?
        .ok_or_else(|| GatorError::NotFound(format!("no feed found with URL {}", url)))
}

fn require_arg<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GatorError::Validation(format!("{} is required", what)));
    }
    Ok(trimmed)
}

fn validate_feed_url(url: &str) -> Result<&str> {
    let url = require_arg(url, "feed URL")?;
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GatorError::Validation(format!(
            "unsupported URL scheme '{}', expected http or https",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    const URL: &str = "https://x.test/rss";

    fn setup() -> (SqliteStore, User, User) {
        let store = SqliteStore::in_memory().unwrap();
        let alice = store.create_user("alice").unwrap();
        let bob = store.create_user("bob").unwrap();
        (store, alice, bob)
    }

    #[test]
    fn test_add_feed_and_follow_creates_feed_once() {
        let (store, alice, bob) = setup();

        let (feed, follow) = add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();
        assert_eq!(feed.name, "Blog");
        assert_eq!(feed.created_by, alice.id);
        assert_eq!(follow.user_name, "alice");
        assert_eq!(follow.feed_name, "Blog");
        assert_eq!(list_all_feeds(&store).unwrap().len(), 1);

        let (again, bob_follow) = add_feed_and_follow(&store, "Other name", URL, &bob).unwrap();
        assert_eq!(again.id, feed.id);
        assert_eq!(again.name, "Blog");
        assert_eq!(again.created_by, alice.id);
        assert_eq!(bob_follow.user_name, "bob");
        assert_eq!(list_all_feeds(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_add_feed_and_follow_twice_same_user_conflicts() {
        let (store, alice, _) = setup();

        add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();
        let err = add_feed_and_follow(&store, "Blog", URL, &alice).unwrap_err();

        assert!(matches!(err, GatorError::Conflict(_)));
        assert_eq!(list_all_feeds(&store).unwrap().len(), 1);
        assert_eq!(list_follows(&store, &alice).unwrap().len(), 1);
    }

    #[test]
    fn test_add_feed_and_follow_validates_arguments() {
        let (store, alice, _) = setup();

        assert!(matches!(
            add_feed_and_follow(&store, "", URL, &alice),
            Err(GatorError::Validation(_))
        ));
        assert!(matches!(
            add_feed_and_follow(&store, "Blog", "  ", &alice),
            Err(GatorError::Validation(_))
        ));
        assert!(matches!(
            add_feed_and_follow(&store, "Blog", "not a url", &alice),
            Err(GatorError::InvalidUrl(_))
        ));
        assert!(matches!(
            add_feed_and_follow(&store, "Blog", "ftp://x.test/rss", &alice),
            Err(GatorError::Validation(_))
        ));
        assert!(list_all_feeds(&store).unwrap().is_empty());
    }

    #[test]
    fn test_follow_requires_existing_feed() {
        let (store, alice, _) = setup();

        let err = follow(&store, URL, &alice).unwrap_err();
        assert!(matches!(err, GatorError::NotFound(_)));
        assert!(list_all_feeds(&store).unwrap().is_empty());

        assert!(matches!(
            follow(&store, "", &alice),
            Err(GatorError::Validation(_))
        ));
    }

    #[test]
    fn test_follow_twice_conflicts_and_keeps_one() {
        let (store, alice, bob) = setup();
        add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();

        let view = follow(&store, URL, &bob).unwrap();
        assert_eq!(view.feed_url, URL);

        let err = follow(&store, URL, &bob).unwrap_err();
        assert!(matches!(err, GatorError::Conflict(_)));
        assert_eq!(list_follows(&store, &bob).unwrap().len(), 1);
    }

    #[test]
    fn test_unfollow_is_idempotent() {
        let (store, alice, bob) = setup();
        add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();

        assert!(unfollow(&store, URL, &alice).unwrap());
        assert!(!unfollow(&store, URL, &alice).unwrap());
        // Never followed at all.
        assert!(!unfollow(&store, URL, &bob).unwrap());

        assert!(list_follows(&store, &alice).unwrap().is_empty());
        assert_eq!(list_all_feeds(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_unfollow_unknown_feed_is_not_found() {
        let (store, alice, _) = setup();
        let err = unfollow(&store, URL, &alice).unwrap_err();
        assert!(matches!(err, GatorError::NotFound(_)));
    }

    #[test]
    fn test_list_follows() {
        let (store, alice, bob) = setup();
        assert!(list_follows(&store, &alice).unwrap().is_empty());

        add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();
        add_feed_and_follow(&store, "News", "https://news.test/rss", &alice).unwrap();
        add_feed_and_follow(&store, "Bob's", "https://bob.test/rss", &bob).unwrap();

        let follows = list_follows(&store, &alice).unwrap();
        assert_eq!(
            follows,
            vec![
                FollowedFeed {
                    name: "Blog".into(),
                    url: URL.into(),
                },
                FollowedFeed {
                    name: "News".into(),
                    url: "https://news.test/rss".into(),
                },
            ]
        );
    }

    #[test]
    fn test_list_all_feeds_includes_creator() {
        let (store, alice, bob) = setup();
        add_feed_and_follow(&store, "Blog", URL, &alice).unwrap();
        add_feed_and_follow(&store, "Bob's", "https://bob.test/rss", &bob).unwrap();

        let feeds = list_all_feeds(&store).unwrap();
        let creators: Vec<&str> = feeds.iter().map(|f| f.creator_name.as_str()).collect();
        assert_eq!(creators, vec!["alice", "bob"]);
    }
}
