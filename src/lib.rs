//! # Gator
//!
//! A personal RSS/Atom feed aggregator for the terminal.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler tick → Store::claim_next_feed → Fetcher → Normalizer → report
//! ```
//!
//! - [`scheduler`]: the polling loop, one feed per tick
//! - [`fetcher`]: HTTP retrieval with a per-call deadline
//! - [`normalizer`]: converts RSS/Atom/JSON feeds to a [`FeedDocument`](domain::FeedDocument)
//! - [`store`]: SQLite persistence for users, feeds and follows
//! - [`follow`]: who follows what
//!
//! ## Quick Start
//!
//! ```bash
//! gator register alice
//! gator addfeed "Rust Blog" https://blog.rust-lang.org/feed.xml
//! gator following
//! gator agg 1m
//! ```

/// Application context, session and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store
/// and fetcher. [`Session`](app::Session) resolves the logged-in user.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration file handling.
///
/// Loads from `~/.config/gator/config.toml`, which also stores the current
/// user name.
pub mod config;

/// Core domain models.
///
/// - [`User`](domain::User), [`Feed`](domain::Feed), [`FollowView`](domain::FollowView)
/// - [`FeedDocument`](domain::FeedDocument): a parsed feed, never persisted
pub mod domain;

/// Feed fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Follow graph operations: add-and-follow, follow, unfollow, listings.
pub mod follow;

/// Feed parsing and normalization.
pub mod normalizer;

/// Fetch scheduler.
///
/// Claims the least recently fetched feed on every tick and fetches it.
/// Stops cooperatively between cycles.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
