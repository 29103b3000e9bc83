use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::app::session::Session;
use crate::config::{Config, ConfigError};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    /// Load config from `config_path` and open the database it points at.
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let config = Config::load_from(&config_path)?;

        let db_path = match config.database_path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        tracing::debug!("Opening database at {}", db_path.display());

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);

        Ok(Self {
            config,
            config_path,
            store,
            fetcher,
        })
    }

    #[cfg(test)]
    pub(crate) fn in_memory(config_path: PathBuf) -> Result<Self> {
        let config = Config::load_from(&config_path)?;
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);

        Ok(Self {
            config,
            config_path,
            store,
            fetcher,
        })
    }

    /// Resolve the logged-in user for an authenticated command.
    pub fn session(&self) -> Result<Session> {
        Session::resolve(&self.config, self.store.as_ref())
    }

    /// Record `name` as the current user in memory and on disk.
    pub fn set_current_user(&mut self, name: &str) -> Result<()> {
        self.config.set_current_user(name, &self.config_path)?;
        Ok(())
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        let gator_dir = data_dir.join("gator");
        std::fs::create_dir_all(&gator_dir)?;
        Ok(gator_dir.join("gator.db"))
    }
}
