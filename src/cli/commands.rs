use crate::app::{AppContext, GatorError, Result};
use crate::domain::User;
use crate::follow;
use crate::scheduler::{cancel_on_signal, Scheduler, SchedulerConfig};
use crate::store::Store;

pub fn register(ctx: &mut AppContext, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GatorError::Validation("username is required".into()));
    }

    let user = ctx.store.create_user(name)?;
    ctx.set_current_user(&user.name)?;

    println!("User {} created successfully", user.name);
    Ok(())
}

pub fn login(ctx: &mut AppContext, name: &str) -> Result<()> {
    let user = ctx
        .store
        .get_user_by_name(name)?
        .ok_or_else(|| GatorError::NotFound(format!("user '{}'", name)))?;
    ctx.set_current_user(&user.name)?;

    println!("User set to {}", user.name);
    Ok(())
}

pub fn list_users(ctx: &AppContext) -> Result<()> {
    let current = ctx.config.current_user_name.as_deref();

    for user in ctx.store.list_users()? {
        if Some(user.name.as_str()) == current {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}

pub fn reset(ctx: &AppContext) -> Result<()> {
    ctx.store.reset()?;
    println!("Database reset successfully.");
    Ok(())
}

pub fn add_feed(ctx: &AppContext, user: &User, name: &str, url: &str) -> Result<()> {
    let (feed, follow) = follow::add_feed_and_follow(ctx.store.as_ref(), name, url, user)?;

    println!("Added feed '{}' with URL '{}'.", feed.display_name(), feed.url);
    println!(
        "User '{}' is now following feed '{}'.",
        follow.user_name, follow.feed_name
    );
    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = follow::list_all_feeds(ctx.store.as_ref())?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for entry in feeds {
        let fetched = entry
            .feed
            .last_fetched_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{}\n  URL: {}\n  Created by: {}\n  Last fetched: {}",
            entry.feed.display_name(),
            entry.feed.url,
            entry.creator_name,
            fetched
        );
    }
    Ok(())
}

pub fn follow_feed(ctx: &AppContext, user: &User, url: &str) -> Result<()> {
    let follow = follow::follow(ctx.store.as_ref(), url, user)?;
    println!(
        "Feed '{}' successfully followed by user '{}'.",
        follow.feed_name, follow.user_name
    );
    Ok(())
}

pub fn list_following(ctx: &AppContext, user: &User) -> Result<()> {
    let follows = follow::list_follows(ctx.store.as_ref(), user)?;

    if follows.is_empty() {
        println!("User '{}' is not following any feeds.", user.name);
        return Ok(());
    }

    println!("User '{}' is following these feeds:", user.name);
    for feed in follows {
        println!("- {} ({})", feed.name, feed.url);
    }
    Ok(())
}

pub fn unfollow_feed(ctx: &AppContext, user: &User, url: &str) -> Result<()> {
    if follow::unfollow(ctx.store.as_ref(), url, user)? {
        println!("Successfully unfollowed {}", url);
    } else {
        println!("User '{}' was not following {}", user.name, url);
    }
    Ok(())
}

/// Poll feeds every `interval` until interrupted.
pub async fn aggregate(ctx: &AppContext, user: &User, interval: &str) -> Result<()> {
    let interval = SchedulerConfig::parse_interval(interval)?;
    let config = SchedulerConfig::new(interval, ctx.config.fetch.timeout())?;
    let scheduler = Scheduler::new(ctx.store.clone(), ctx.fetcher.clone(), config);
    cancel_on_signal(scheduler.shutdown_token());

    tracing::debug!("Aggregating on behalf of {}", user.name);
    println!(
        "Collecting feeds every {}",
        SchedulerConfig::format_interval(interval)
    );

    scheduler
        .run_with(|report| {
            println!(
                "Found {} items in feed: {}",
                report.item_count(),
                report.feed.display_name()
            );
            for title in report.titles() {
                println!("- {}", title);
            }
        })
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn context(dir: &tempfile::TempDir) -> AppContext {
        AppContext::in_memory(dir.path().join("config.toml")).unwrap()
    }

    #[test]
    fn test_register_logs_in_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);

        register(&mut ctx, "alice").unwrap();

        assert_eq!(ctx.config.current_user_name.as_deref(), Some("alice"));
        let on_disk = Config::load_from(&ctx.config_path).unwrap();
        assert_eq!(on_disk.current_user_name.as_deref(), Some("alice"));
        assert_eq!(ctx.session().unwrap().user.name, "alice");
    }

    #[test]
    fn test_register_duplicate_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);

        register(&mut ctx, "alice").unwrap();
        let err = register(&mut ctx, "alice").unwrap_err();
        assert!(matches!(err, GatorError::Conflict(_)));

        let err = register(&mut ctx, " ").unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));
    }

    #[test]
    fn test_login_switches_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        register(&mut ctx, "alice").unwrap();
        register(&mut ctx, "bob").unwrap();

        login(&mut ctx, "alice").unwrap();
        assert_eq!(ctx.session().unwrap().user.name, "alice");

        let err = login(&mut ctx, "carol").unwrap_err();
        assert!(matches!(err, GatorError::NotFound(_)));
        assert_eq!(ctx.session().unwrap().user.name, "alice");
    }

    #[tokio::test]
    async fn test_aggregate_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        register(&mut ctx, "alice").unwrap();
        let user = ctx.session().unwrap().user;

        let err = aggregate(&ctx, &user, "0s").await.unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));

        let err = aggregate(&ctx, &user, "soon").await.unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_aggregate_rejects_zero_fetch_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch]\ntimeout_secs = 0\n").unwrap();
        let mut ctx = AppContext::in_memory(path).unwrap();
        register(&mut ctx, "alice").unwrap();
        let user = ctx.session().unwrap().user;

        let err = aggregate(&ctx, &user, "1m").await.unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));
    }
}
