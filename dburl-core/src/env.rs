//! Reading the database URL from the environment.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ConnectionResult;
use crate::overrides::Overrides;
use crate::registry::{Registry, global};
use crate::settings::DatabaseSettings;

/// Environment variable read when no other name is given.
pub const DEFAULT_ENV: &str = "DATABASE_URL";

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;

    /// Check if a variable exists.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Default environment source using std::env.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl Registry {
    /// Parse the URL held in an environment variable.
    ///
    /// Falls back to `default` when the variable is unset. Returns `Ok(None)`
    /// without parsing when neither yields a non-empty URL.
    pub fn config_from<S: EnvSource + ?Sized>(
        &self,
        source: &S,
        env: &str,
        default: Option<&str>,
        overrides: &Overrides,
    ) -> ConnectionResult<Option<DatabaseSettings>> {
        let url = source.get(env).or_else(|| default.map(String::from));
        match url.filter(|url| !url.is_empty()) {
            Some(url) => {
                debug!(env = %env, "Loading database settings from environment");
                self.parse_with(&url, overrides).map(Some)
            }
            None => {
                debug!(env = %env, "No database URL configured");
                Ok(None)
            }
        }
    }
}

/// Parse the URL held in an environment variable of the process.
///
/// ```rust,no_run
/// use dburl_core::{DEFAULT_ENV, Overrides, config};
///
/// let settings = config(DEFAULT_ENV, Some("sqlite://"), &Overrides::new())?;
/// # Ok::<(), dburl_core::ConnectionError>(())
/// ```
pub fn config(
    env: &str,
    default: Option<&str>,
    overrides: &Overrides,
) -> ConnectionResult<Option<DatabaseSettings>> {
    global().config_from(&StdEnvSource, env, default, overrides)
}

/// Parse the URL held in a variable of the given source.
pub fn config_from<S: EnvSource + ?Sized>(
    source: &S,
    env: &str,
    default: Option<&str>,
    overrides: &Overrides,
) -> ConnectionResult<Option<DatabaseSettings>> {
    global().config_from(source, env, default, overrides)
}

/// Parse `DATABASE_URL` with no default and no overrides.
pub fn from_database_url() -> ConnectionResult<Option<DatabaseSettings>> {
    config(DEFAULT_ENV, None, &Overrides::new())
}
