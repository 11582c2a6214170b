//! Database settings produced from a URL.
//!
//! [`DatabaseSettings`] is both the working value that postprocessing hooks
//! mutate and the final value handed to the host ORM. It has a closed set of
//! well-known fields plus an open [`extra`](DatabaseSettings::extra) map for
//! caller-defined keys such as `CONN_MAX_AGE` or `TEST`.
//!
//! When serialized it becomes a flat mapping with uppercase keys:
//!
//! ```rust
//! use dburl_core::DatabaseSettings;
//!
//! let mut settings = DatabaseSettings::new("django.db.backends.postgresql", "app");
//! settings.host = Some("localhost".to_string());
//!
//! let value = settings.to_value();
//! assert_eq!(value["ENGINE"], "django.db.backends.postgresql");
//! assert_eq!(value["HOST"], "localhost");
//! assert!(value.get("OPTIONS").is_none());
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{ConnectionError, ConnectionResult};

/// Well-known setting keys.
pub mod keys {
    /// Backend identifier.
    pub const ENGINE: &str = "ENGINE";
    /// Database name or file path.
    pub const NAME: &str = "NAME";
    /// Username.
    pub const USER: &str = "USER";
    /// Password.
    pub const PASSWORD: &str = "PASSWORD";
    /// Host.
    pub const HOST: &str = "HOST";
    /// Port.
    pub const PORT: &str = "PORT";
    /// Driver options.
    pub const OPTIONS: &str = "OPTIONS";
}

/// Driver options keyed by option name.
pub type Options = IndexMap<String, Value>;

/// Port setting.
///
/// URLs carry numeric ports, but some drivers want a string; an absent port
/// is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Port {
    /// Numeric port.
    Number(u16),
    /// Textual port (empty when the URL has none).
    Text(String),
}

impl Port {
    /// The port used when a URL has none.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Check if this is the empty port.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Get the numeric port, if any.
    pub fn as_number(&self) -> Option<u16> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Convert into the textual form.
    pub fn into_text(self) -> Self {
        match self {
            Self::Number(n) => Self::Text(n.to_string()),
            text => text,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self::Number(port)
    }
}

impl From<&str> for Port {
    fn from(port: &str) -> Self {
        Self::Text(port.to_string())
    }
}

impl From<String> for Port {
    fn from(port: String) -> Self {
        Self::Text(port)
    }
}

/// Settings for one database, in the shape the host ORM consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Backend identifier.
    pub engine: String,
    /// Database name or file path.
    pub name: String,
    /// Username.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Host.
    pub host: Option<String>,
    /// Port.
    pub port: Option<Port>,
    /// Driver options. Omitted from the output when empty.
    pub options: Options,
    /// Any other settings, in insertion order.
    pub extra: IndexMap<String, Value>,
}

impl DatabaseSettings {
    /// Create settings holding only an engine and a name.
    pub fn new(engine: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            name: name.into(),
            user: None,
            password: None,
            host: None,
            port: None,
            options: Options::new(),
            extra: IndexMap::new(),
        }
    }

    /// Get the driver options, or `None` when there are none.
    pub fn options(&self) -> Option<&Options> {
        if self.options.is_empty() {
            None
        } else {
            Some(&self.options)
        }
    }

    /// Get a single driver option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Set a driver option.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.options.insert(key.into(), value.into());
    }

    /// Remove a driver option and return its value.
    pub fn take_option(&mut self, key: &str) -> Option<Value> {
        self.options.shift_remove(key)
    }

    /// Merge options into the current ones. Incoming keys win.
    pub fn merge_options(&mut self, options: Options) {
        self.options.extend(options);
    }

    /// Check if this names the in-memory database.
    pub fn is_memory(&self) -> bool {
        self.name == crate::parser::MEMORY_NAME
    }

    /// Read any setting by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            keys::ENGINE => Some(Value::from(self.engine.as_str())),
            keys::NAME => Some(Value::from(self.name.as_str())),
            keys::USER => self.user.as_deref().map(Value::from),
            keys::PASSWORD => self.password.as_deref().map(Value::from),
            keys::HOST => self.host.as_deref().map(Value::from),
            keys::PORT => self.port.as_ref().map(Port::to_value),
            keys::OPTIONS => self.options().map(options_to_value),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Apply one explicit setting, replacing any existing value.
    ///
    /// `OPTIONS` is merged rather than replaced. `null` clears the optional
    /// well-known settings. Values of the wrong shape for a well-known key
    /// are rejected.
    pub fn set(&mut self, key: &str, value: Value) -> ConnectionResult<()> {
        match key {
            keys::ENGINE => self.engine = require_string(key, value)?,
            keys::NAME => self.name = require_string(key, value)?,
            keys::USER => self.user = optional_string(key, value)?,
            keys::PASSWORD => self.password = optional_string(key, value)?,
            keys::HOST => self.host = optional_string(key, value)?,
            keys::PORT => self.port = port_from_value(value)?,
            keys::OPTIONS => match value {
                Value::Object(map) => self.merge_options(map.into_iter().collect()),
                _ => {
                    return Err(ConnectionError::invalid_override(
                        key,
                        "expected a mapping of options",
                    ));
                }
            },
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
        Ok(())
    }

    /// Remove a setting and return its previous value.
    ///
    /// `ENGINE` and `NAME` are always present and are left untouched.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match key {
            keys::ENGINE | keys::NAME => None,
            keys::USER => self.user.take().map(Value::from),
            keys::PASSWORD => self.password.take().map(Value::from),
            keys::HOST => self.host.take().map(Value::from),
            keys::PORT => self.port.take().map(|p| p.to_value()),
            keys::OPTIONS => {
                let options = std::mem::take(&mut self.options);
                (!options.is_empty()).then(|| options_to_value(&options))
            }
            other => self.extra.shift_remove(other),
        }
    }

    /// Flatten into an ordered mapping with uppercase keys.
    pub fn to_map(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::with_capacity(7 + self.extra.len());
        map.insert(keys::ENGINE.to_string(), Value::from(self.engine.as_str()));
        map.insert(keys::NAME.to_string(), Value::from(self.name.as_str()));
        if let Some(ref user) = self.user {
            map.insert(keys::USER.to_string(), Value::from(user.as_str()));
        }
        if let Some(ref password) = self.password {
            map.insert(keys::PASSWORD.to_string(), Value::from(password.as_str()));
        }
        if let Some(ref host) = self.host {
            map.insert(keys::HOST.to_string(), Value::from(host.as_str()));
        }
        if let Some(ref port) = self.port {
            map.insert(keys::PORT.to_string(), port.to_value());
        }
        if let Some(options) = self.options() {
            map.insert(keys::OPTIONS.to_string(), options_to_value(options));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Flatten into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map().into_iter().collect())
    }
}

impl Serialize for DatabaseSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.to_map())
    }
}

fn options_to_value(options: &Options) -> Value {
    Value::Object(
        options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

fn require_string(key: &str, value: Value) -> ConnectionResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ConnectionError::invalid_override(
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

fn optional_string(key: &str, value: Value) -> ConnectionResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => require_string(key, other).map(Some),
    }
}

fn port_from_value(value: Value) -> ConnectionResult<Option<Port>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Port::Text(s))),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(|n| Some(Port::Number(n)))
            .ok_or_else(|| {
                ConnectionError::invalid_override(keys::PORT, format!("{} is not a valid port", n))
            }),
        other => Err(ConnectionError::invalid_override(
            keys::PORT,
            format!("expected a number or string, got {}", other),
        )),
    }
}
