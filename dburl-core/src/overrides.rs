//! Explicit settings that win over anything parsed from a URL.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConnectionResult;
use crate::settings::{DatabaseSettings, Options, Port, keys};

/// Caller-supplied settings applied after parsing and postprocessing.
///
/// `OPTIONS` is merged key by key into the parsed options; every other key
/// replaces the parsed value outright.
///
/// Overrides can be built in code or deserialized from a settings file:
///
/// ```rust
/// use dburl_core::Overrides;
///
/// let overrides = Overrides::new()
///     .engine("django_mysqlpool.backends.mysqlpool")
///     .option("reconnect", "false")
///     .setting("CONN_MAX_AGE", 600);
/// assert_eq!(overrides.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Overrides {
    entries: IndexMap<String, Value>,
}

impl Overrides {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the backend identifier.
    pub fn engine(self, engine: impl Into<String>) -> Self {
        self.setting(keys::ENGINE, engine.into())
    }

    /// Override the database name.
    pub fn name(self, name: impl Into<String>) -> Self {
        self.setting(keys::NAME, name.into())
    }

    /// Override the username.
    pub fn user(self, user: impl Into<String>) -> Self {
        self.setting(keys::USER, user.into())
    }

    /// Override the password.
    pub fn password(self, password: impl Into<String>) -> Self {
        self.setting(keys::PASSWORD, password.into())
    }

    /// Override the host.
    pub fn host(self, host: impl Into<String>) -> Self {
        self.setting(keys::HOST, host.into())
    }

    /// Override the port.
    pub fn port(self, port: impl Into<Port>) -> Self {
        let value = match port.into() {
            Port::Number(n) => Value::from(n),
            Port::Text(s) => Value::from(s),
        };
        self.setting(keys::PORT, value)
    }

    /// Add a single driver option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let options = self
            .entries
            .entry(keys::OPTIONS.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if !options.is_object() {
            *options = Value::Object(Default::default());
        }
        if let Value::Object(map) = options {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Add several driver options.
    pub fn options(self, options: Options) -> Self {
        options
            .into_iter()
            .fold(self, |overrides, (key, value)| overrides.option(key, value))
    }

    /// Set any setting, including caller-defined ones such as `CONN_MAX_AGE`.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Get an override by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Number of overridden keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over overrides in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply these overrides to parsed settings.
    ///
    /// `OPTIONS` is merged before any other key is applied.
    pub fn apply(&self, settings: &mut DatabaseSettings) -> ConnectionResult<()> {
        if let Some(options) = self.entries.get(keys::OPTIONS) {
            settings.set(keys::OPTIONS, options.clone())?;
        }
        for (key, value) in &self.entries {
            if key != keys::OPTIONS {
                settings.set(key, value.clone())?;
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
