//! Built-in scheme registrations and the postprocessing hooks they use.
//!
//! | Scheme | Backend |
//! |--------|---------|
//! | `spatialite` | `django.contrib.gis.db.backends.spatialite` |
//! | `mysqlgis` | `django.contrib.gis.db.backends.mysql` |
//! | `oraclegis` | `django.contrib.gis.db.backends.oracle` |
//! | `sqlite` | `django.db.backends.sqlite3` |
//! | `oracle` | `django.db.backends.oracle` |
//! | `mysql` | `django.db.backends.mysql` |
//! | `postgres`, `postgresql`, `pgsql` | `django.db.backends.postgresql` |
//! | `postgis` | `django.contrib.gis.db.backends.postgis` |
//!
//! The hooks are public so applications can attach them to their own
//! schemes:
//!
//! ```rust
//! use dburl_core::{Registry, backends};
//!
//! let registry = Registry::with_builtins();
//! registry
//!     .register("django_redshift_backend", "redshift")
//!     .postprocess(backends::apply_current_schema);
//!
//! let settings = registry
//!     .parse("redshift://user:pw@cluster:5439/dev?currentSchema=analytics")
//!     .unwrap();
//! assert_eq!(
//!     settings.option("options").unwrap(),
//!     "-c search_path=analytics"
//! );
//! ```

use serde_json::{Value, json};

use crate::parser::MEMORY_NAME;
use crate::registry::{Registry, Schemes};
use crate::settings::{DatabaseSettings, Port};

/// SQLite backend.
pub const SQLITE: &str = "django.db.backends.sqlite3";
/// SpatiaLite backend.
pub const SPATIALITE: &str = "django.contrib.gis.db.backends.spatialite";
/// PostgreSQL backend.
pub const POSTGRESQL: &str = "django.db.backends.postgresql";
/// PostGIS backend.
pub const POSTGIS: &str = "django.contrib.gis.db.backends.postgis";
/// MySQL backend.
pub const MYSQL: &str = "django.db.backends.mysql";
/// MySQL GIS backend.
pub const MYSQL_GIS: &str = "django.contrib.gis.db.backends.mysql";
/// Oracle backend.
pub const ORACLE: &str = "django.db.backends.oracle";
/// Oracle GIS backend.
pub const ORACLE_GIS: &str = "django.contrib.gis.db.backends.oracle";

/// Register the built-in schemes.
pub fn register_builtins(registry: &Registry) {
    registry.register(SPATIALITE, Schemes::Derived);
    registry.register(MYSQL_GIS, "mysqlgis");
    registry.register(ORACLE_GIS, "oraclegis");
    registry
        .register(SQLITE, "sqlite")
        .postprocess(default_to_memory);

    registry
        .register(ORACLE, Schemes::Derived)
        .postprocess(stringify_port);

    registry
        .register(MYSQL, Schemes::Derived)
        .postprocess(apply_ssl_ca);

    registry
        .register(POSTGRESQL, ["postgres", "postgresql", "pgsql"])
        .postprocess(apply_current_schema);
    registry
        .register(POSTGIS, Schemes::Derived)
        .postprocess(apply_current_schema);
}

/// Store the port as a string.
pub fn stringify_port(settings: &mut DatabaseSettings) {
    settings.port = Some(settings.port.take().unwrap_or_else(Port::empty).into_text());
}

/// Move the `ssl-ca` option into an `ssl` mapping.
pub fn apply_ssl_ca(settings: &mut DatabaseSettings) {
    if let Some(ca) = settings.take_option("ssl-ca").filter(is_truthy) {
        settings.set_option("ssl", json!({ "ca": ca }));
    }
}

/// Turn the `currentSchema` option into a `search_path` connection option.
pub fn apply_current_schema(settings: &mut DatabaseSettings) {
    if let Some(schema) = settings.take_option("currentSchema").filter(is_truthy) {
        let schema = match schema {
            Value::String(s) => s,
            other => other.to_string(),
        };
        settings.set_option("options", format!("-c search_path={}", schema));
    }
}

/// Use the in-memory database when no name is given.
pub fn default_to_memory(settings: &mut DatabaseSettings) {
    if settings.name.is_empty() {
        settings.name = MEMORY_NAME.to_string();
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
