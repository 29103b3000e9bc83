use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rusqlite_migration::{Migrations, M};

use crate::app::{GatorError, Result};
use crate::domain::{Feed, FeedWithCreator, FollowView, User};
use crate::store::Store;

const USER_COLUMNS: &str = "id, name, created_at, updated_at";

const FEED_COLUMNS: &str = "id, name, url, created_by, created_at, updated_at, last_fetched_at";

const FOLLOW_VIEW_SELECT: &str = "SELECT ff.id, ff.user_id, ff.feed_id, u.name, f.name, f.url, ff.created_at, ff.updated_at
     FROM feed_follows ff
     JOIN users u ON u.id = ff.user_id
     JOIN feeds f ON f.id = ff.feed_id";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;

        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations.to_latest(&mut conn).map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            GatorError::Repository(rusqlite::Error::InvalidQuery)
        })?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            GatorError::Repository(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Fixed-width UTC timestamps so that text ordering matches time ordering.
    fn format_datetime(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn column_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
        Self::parse_datetime(s).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("invalid timestamp '{}'", s).into(),
            )
        })
    }

    fn required_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let s: String = row.get(idx)?;
        Self::column_datetime(idx, &s)
    }

    fn optional_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
        row.get::<_, Option<String>>(idx)?
            .map(|s| Self::column_datetime(idx, &s))
            .transpose()
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: Self::required_datetime(row, 2)?,
            updated_at: Self::required_datetime(row, 3)?,
        })
    }

    fn row_to_feed(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            created_by: row.get(3)?,
            created_at: Self::required_datetime(row, 4)?,
            updated_at: Self::required_datetime(row, 5)?,
            last_fetched_at: Self::optional_datetime(row, 6)?,
        })
    }

    fn row_to_follow(row: &Row<'_>) -> rusqlite::Result<FollowView> {
        Ok(FollowView {
            id: row.get(0)?,
            user_id: row.get(1)?,
            feed_id: row.get(2)?,
            user_name: row.get(3)?,
            feed_name: row.get(4)?,
            feed_url: row.get(5)?,
            created_at: Self::required_datetime(row, 6)?,
            updated_at: Self::required_datetime(row, 7)?,
        })
    }

    /// Translate constraint failures into domain errors.
    fn constraint_error(err: rusqlite::Error, what: impl Into<String>) -> GatorError {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return GatorError::Conflict(what.into())
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return GatorError::NotFound(what.into())
                }
                _ => {}
            }
        }
        GatorError::Repository(err)
    }

    fn select_feed(conn: &Connection, id: i64) -> Result<Option<Feed>> {
        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1"),
                params![id],
                Self::row_to_feed,
            )
            .optional()?;
        Ok(feed)
    }

    /// Stamp for the next claim: `now`, unless that would not sort after
    /// every stamp already handed out (clock stepped back, or two claims in
    /// the same microsecond).
    fn next_claim_stamp(conn: &Connection, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let newest: Option<String> =
            conn.query_row("SELECT MAX(last_fetched_at) FROM feeds", [], |row| row.get(0))?;
        let newest = newest
            .map(|s| Self::column_datetime(0, &s))
            .transpose()?;

        Ok(match newest {
            Some(newest) if newest >= now => newest + TimeDelta::microseconds(1),
            _ => now,
        })
    }
}

impl Store for SqliteStore {
    fn create_user(&self, name: &str) -> Result<User> {
        let conn = self.conn()?;
        let now = Self::format_datetime(Utc::now());

        conn.execute(
            "INSERT INTO users (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )
        .map_err(|e| Self::constraint_error(e, format!("user '{}'", name)))?;

        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![conn.last_insert_rowid()],
            Self::row_to_user,
        )?;
        Ok(user)
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"),
                params![name],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn reset(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM users", [])?;
        Ok(())
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![url],
                Self::row_to_feed,
            )
            .optional()?;
        Ok(feed)
    }

    fn create_feed(&self, name: &str, url: &str, creator_id: i64) -> Result<Feed> {
        let conn = self.conn()?;
        let now = Self::format_datetime(Utc::now());

        conn.execute(
            "INSERT INTO feeds (name, url, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, url, creator_id, now],
        )
        .map_err(|e| Self::constraint_error(e, format!("feed '{}'", url)))?;

        Self::select_feed(&conn, conn.last_insert_rowid())?
            .ok_or_else(|| GatorError::NotFound(format!("feed '{}'", url)))
    }

    fn list_feeds_with_creators(&self) -> Result<Vec<FeedWithCreator>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT f.id, f.name, f.url, f.created_by, f.created_at, f.updated_at, f.last_fetched_at, u.name
             FROM feeds f
             JOIN users u ON u.id = f.created_by
             ORDER BY f.created_at, f.id",
        )?;

        let feeds = stmt
            .query_map([], |row| {
                Ok(FeedWithCreator {
                    feed: Self::row_to_feed(row)?,
                    creator_name: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn claim_next_feed(&self, now: DateTime<Utc>) -> Result<Feed> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // NULLs sort first in ascending order.
        let next_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM feeds ORDER BY last_fetched_at ASC, id ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(feed_id) = next_id else {
            return Err(GatorError::NoFeedsAvailable);
        };

        let stamp = Self::format_datetime(Self::next_claim_stamp(&tx, now)?);
        tx.execute(
            "UPDATE feeds SET last_fetched_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![stamp, feed_id],
        )?;
        let feed = Self::select_feed(&tx, feed_id)?
            .ok_or_else(|| GatorError::NotFound(format!("feed {}", feed_id)))?;
        tx.commit()?;

        Ok(feed)
    }

    fn create_follow(&self, user_id: i64, feed_id: i64) -> Result<FollowView> {
        let conn = self.conn()?;
        let now = Self::format_datetime(Utc::now());

        conn.execute(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![user_id, feed_id, now],
        )
        .map_err(|e| {
            Self::constraint_error(e, format!("follow of feed {} by user {}", feed_id, user_id))
        })?;

        let follow = conn.query_row(
            &format!("{FOLLOW_VIEW_SELECT} WHERE ff.id = ?1"),
            params![conn.last_insert_rowid()],
            Self::row_to_follow,
        )?;
        Ok(follow)
    }

    fn delete_follow(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let conn = self.conn()?;

        let removed = conn.execute(
            "DELETE FROM feed_follows WHERE user_id = ?1 AND feed_id = ?2",
            params![user_id, feed_id],
        )?;
        Ok(removed > 0)
    }

    fn list_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowView>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "{FOLLOW_VIEW_SELECT} WHERE ff.user_id = ?1 ORDER BY ff.created_at, ff.id"
        ))?;
        let follows = stmt
            .query_map(params![user_id], Self::row_to_follow)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(follows)
    }
}
