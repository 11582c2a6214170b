//! Scheme to backend registry.
//!
//! Every URL scheme maps to a [`BackendDescriptor`]: an opaque backend
//! identifier plus an optional postprocessing hook. Registration is two-phase:
//! [`Registry::register`] records the descriptor and returns a
//! [`Registration`] handle, and [`Registration::postprocess`] binds the hook
//! afterwards. All schemes named in one `register` call share one descriptor,
//! so the hook bound through the handle applies to each of them.
//!
//! ```rust
//! use dburl_core::{DatabaseSettings, Registry};
//!
//! fn stringify_port(settings: &mut DatabaseSettings) {
//!     settings.port = settings.port.take().map(|p| p.into_text());
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register("sql_server.pyodbc", ["mssql", "sqlserver"])
//!     .postprocess(stringify_port);
//!
//! let backend = registry.lookup("sqlserver").unwrap();
//! assert_eq!(backend.backend(), "sql_server.pyodbc");
//! assert!(backend.has_postprocess());
//! ```
//!
//! # Concurrency
//!
//! The process-wide registry returned by [`global`] is safe to share, but a
//! parse only sees registrations that happened before it. Register custom
//! schemes during startup, before any URL is parsed.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{ConnectionError, ConnectionResult};
use crate::settings::DatabaseSettings;

/// Postprocessing hook applied to freshly parsed settings.
pub type Postprocess = Arc<dyn Fn(&mut DatabaseSettings) + Send + Sync>;

/// Backend bound to one or more URL schemes.
pub struct BackendDescriptor {
    backend: String,
    postprocess: RwLock<Option<Postprocess>>,
}

impl BackendDescriptor {
    /// Create a descriptor with no postprocessing hook.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            postprocess: RwLock::new(None),
        }
    }

    /// Get the backend identifier.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Check if a postprocessing hook is bound.
    pub fn has_postprocess(&self) -> bool {
        self.postprocess.read().is_some()
    }

    /// Run the postprocessing hook, if any.
    pub fn postprocess(&self, settings: &mut DatabaseSettings) {
        // Clone out of the lock so a hook may rebind hooks.
        let hook = self.postprocess.read().clone();
        if let Some(hook) = hook {
            trace!(backend = %self.backend, "Running postprocess hook");
            hook(settings);
        }
    }

    fn set_postprocess(&self, hook: Postprocess) {
        *self.postprocess.write() = Some(hook);
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("backend", &self.backend)
            .field("has_postprocess", &self.has_postprocess())
            .finish()
    }
}

/// Scheme names for a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Schemes {
    /// Use the last dot-separated segment of the backend identifier.
    #[default]
    Derived,
    /// Use these scheme names.
    Named(Vec<String>),
}

impl Schemes {
    /// Resolve to concrete scheme names for a backend.
    pub fn resolve(self, backend: &str) -> Vec<String> {
        match self {
            Self::Named(names) if !names.is_empty() => names,
            _ => vec![derive_scheme(backend).to_string()],
        }
    }
}

impl From<&str> for Schemes {
    fn from(scheme: &str) -> Self {
        Self::Named(vec![scheme.to_string()])
    }
}

impl From<String> for Schemes {
    fn from(scheme: String) -> Self {
        Self::Named(vec![scheme])
    }
}

impl<const N: usize> From<[&str; N]> for Schemes {
    fn from(schemes: [&str; N]) -> Self {
        Self::Named(schemes.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[&str]> for Schemes {
    fn from(schemes: &[&str]) -> Self {
        Self::Named(schemes.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for Schemes {
    fn from(schemes: Vec<String>) -> Self {
        Self::Named(schemes)
    }
}

fn derive_scheme(backend: &str) -> &str {
    backend.rsplit('.').next().unwrap_or(backend)
}

/// Handle returned by [`Registry::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    descriptor: Arc<BackendDescriptor>,
    schemes: Vec<String>,
}

impl Registration {
    /// Bind a postprocessing hook to every scheme of this registration.
    ///
    /// Binding again replaces the earlier hook. The same function may be
    /// bound through several registrations.
    pub fn postprocess<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut DatabaseSettings) + Send + Sync + 'static,
    {
        self.descriptor.set_postprocess(Arc::new(hook));
        self
    }

    /// Bind an already shared hook.
    pub fn postprocess_shared(&self, hook: Postprocess) -> &Self {
        self.descriptor.set_postprocess(hook);
        self
    }

    /// Get the registered descriptor.
    pub fn descriptor(&self) -> &Arc<BackendDescriptor> {
        &self.descriptor
    }

    /// Get the scheme names this registration covers.
    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }
}

/// Mapping from URL scheme to backend.
#[derive(Debug, Default)]
pub struct Registry {
    backends: RwLock<HashMap<String, Arc<BackendDescriptor>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in schemes.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::backends::register_builtins(&registry);
        registry
    }

    /// Register a backend for one or more schemes.
    ///
    /// An existing registration for any of the schemes is replaced.
    pub fn register(&self, backend: &str, schemes: impl Into<Schemes>) -> Registration {
        let descriptor = Arc::new(BackendDescriptor::new(backend));
        let schemes = schemes.into().resolve(backend);

        let mut backends = self.backends.write();
        for scheme in &schemes {
            let replaced = backends
                .insert(scheme.clone(), Arc::clone(&descriptor))
                .is_some();
            debug!(scheme = %scheme, backend = %backend, replaced, "Registered scheme");
        }

        Registration {
            descriptor,
            schemes,
        }
    }

    /// Look up the backend for a scheme.
    pub fn lookup(&self, scheme: &str) -> ConnectionResult<Arc<BackendDescriptor>> {
        self.backends
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| ConnectionError::unknown_scheme(scheme))
    }

    /// Check if a scheme is registered.
    pub fn contains(&self, scheme: &str) -> bool {
        self.backends.read().contains_key(scheme)
    }

    /// List registered schemes in sorted order.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<_> = self.backends.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Number of registered schemes.
    pub fn len(&self) -> usize {
        self.backends.read().len()
    }

    /// Check if no scheme is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.read().is_empty()
    }
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::with_builtins);

/// Get the process-wide registry, initialized with the built-in schemes.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Register a backend in the process-wide registry.
pub fn register(backend: &str, schemes: impl Into<Schemes>) -> Registration {
    global().register(backend, schemes)
}

/// Look up a scheme in the process-wide registry.
pub fn lookup(scheme: &str) -> ConnectionResult<Arc<BackendDescriptor>> {
    global().lookup(scheme)
}
