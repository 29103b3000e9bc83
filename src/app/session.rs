use crate::app::{GatorError, Result};
use crate::config::Config;
use crate::domain::User;
use crate::store::Store;

/// The logged-in user, resolved once per command.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
}

impl Session {
    /// Look up the user named in the config's `current_user_name`.
    pub fn resolve<S: Store + ?Sized>(config: &Config, store: &S) -> Result<Self> {
        let name = config
            .current_user_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GatorError::Validation("no user is logged in".into()))?;

        let user = store
            .get_user_by_name(name)?
            .ok_or_else(|| GatorError::NotFound(format!("user '{}'", name)))?;

        Ok(Self { user })
    }
}
