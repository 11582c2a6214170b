//! Logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the application. With the `tracing-subscriber` feature, [`init`] installs
//! one controlled by environment variables:
//!
//! - `DBURL_DEBUG=true|1|yes` - Enable debug logging
//! - `DBURL_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `DBURL_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! dburl_core::logging::init();
//! ```

use std::sync::Once;

use crate::env::{EnvSource, StdEnvSource};

static INIT: Once = Once::new();

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace.
    Trace,
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Get the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

/// Logging settings read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether logging was requested at all.
    pub enabled: bool,
    /// Level filter.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from an environment source.
    pub fn from_source<S: EnvSource + ?Sized>(source: &S) -> Self {
        let debug = source
            .get("DBURL_DEBUG")
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"));
        let explicit = source.get("DBURL_LOG_LEVEL");

        let fallback = if debug { LogLevel::Debug } else { LogLevel::Warn };
        let level = explicit
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(fallback);

        let format = match source.get("DBURL_LOG_FORMAT").map(|f| f.to_lowercase()) {
            Some(f) if f == "pretty" => LogFormat::Pretty,
            Some(f) if f == "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        };

        Self {
            enabled: debug || explicit.is_some(),
            level,
            format,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&StdEnvSource)
    }
}

/// Install a global subscriber if logging was requested.
///
/// Only the first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_env();
        if !settings.enabled {
            return;
        }
        install(settings);
    });
}

#[cfg(feature = "tracing-subscriber")]
fn install(settings: LogSettings) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = settings.level.as_str();
    let filter = EnvFilter::try_new(format!("dburl={},dburl_core={}", level, level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level, format = ?settings.format, "dburl logging initialized");
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_settings: LogSettings) {
    // No subscriber available; events reach whatever the application set up.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvSource;

    #[test]
    fn test_disabled_by_default() {
        let settings = LogSettings::from_source(&MapEnvSource::new());
        assert!(!settings.enabled);
        assert_eq!(settings.level, LogLevel::Warn);
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag() {
        for value in ["true", "1", "YES"] {
            let source = MapEnvSource::new().set("DBURL_DEBUG", value);
            let settings = LogSettings::from_source(&source);
            assert!(settings.enabled, "{value}");
            assert_eq!(settings.level, LogLevel::Debug);
        }

        let source = MapEnvSource::new().set("DBURL_DEBUG", "off");
        assert!(!LogSettings::from_source(&source).enabled);
    }

    #[test]
    fn test_explicit_level_and_format() {
        let source = MapEnvSource::new()
            .set("DBURL_LOG_LEVEL", "Trace")
            .set("DBURL_LOG_FORMAT", "compact");
        let settings = LogSettings::from_source(&source);
        assert!(settings.enabled);
        assert_eq!(settings.level, LogLevel::Trace);
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let source = MapEnvSource::new()
            .set("DBURL_DEBUG", "1")
            .set("DBURL_LOG_LEVEL", "loud");
        assert_eq!(LogSettings::from_source(&source).level, LogLevel::Debug);
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
