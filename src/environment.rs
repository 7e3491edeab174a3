//! Ambient environment and the install guard.
//!
//! An [`Environment`] stands in for the host's global object: a set of named
//! bindings plus the location of the current page, if any. [`install`] binds
//! a fresh [`Chrome`] under [`BINDING_NAME`] unless something is already bound
//! there, in which case nothing changes.
//!
//! A process-wide environment is available through [`install_global`] and
//! [`global_chrome`] for code that expects a single ambient surface.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::Config;
use crate::diagnostics::{Diagnostics, TARGET};
use crate::mock::Chrome;

/// Name of the global binding the surface is installed under.
pub const BINDING_NAME: &str = "chrome";

/// Location of the page the surface is installed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// `scheme://authority`, without a trailing slash.
    pub origin: String,
    pub href: String,
}

impl Location {
    /// Derive the origin from a full href.
    ///
    /// An href without `://` is its own origin.
    pub fn from_href(href: &str) -> Self {
        let origin = match href.find("://") {
            Some(scheme_end) => {
                let authority_start = scheme_end + 3;
                let authority_end = href[authority_start..]
                    .find(['/', '?', '#'])
                    .map(|i| authority_start + i)
                    .unwrap_or(href.len());
                href[..authority_end].to_string()
            }
            None => href.trim_end_matches('/').to_string(),
        };

        Self {
            origin,
            href: href.to_string(),
        }
    }
}

/// A value bound in the environment.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A chromock surface.
    Chrome(Arc<Chrome>),
    /// Anything else, e.g. a real or foreign `chrome` object.
    Foreign(Value),
}

#[derive(Debug, Default)]
pub struct Environment {
    globals: HashMap<String, Binding>,
    location: Option<Location>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: Location) -> Self {
        Self {
            globals: HashMap::new(),
            location: Some(location),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn set_location(&mut self, location: Option<Location>) {
        self.location = location;
    }

    pub fn has(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.globals.get(name)
    }

    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.globals.insert(name.into(), binding)
    }

    pub fn unbind(&mut self, name: &str) -> Option<Binding> {
        self.globals.remove(name)
    }

    /// The chromock surface bound under [`BINDING_NAME`], if that is what is bound there.
    pub fn chrome(&self) -> Option<Arc<Chrome>> {
        match self.globals.get(BINDING_NAME) {
            Some(Binding::Chrome(chrome)) => Some(Arc::clone(chrome)),
            _ => None,
        }
    }
}

/// Install a fresh surface into `env` unless one is already bound.
///
/// Returns whether installation happened.
pub fn install(env: &mut Environment, config: &Config) -> bool {
    let diagnostics = Diagnostics::new(&config.diagnostics);

    if env.has(BINDING_NAME) {
        diagnostics.record("install", "skipped, binding already present");
        return false;
    }

    let chrome = Arc::new(Chrome::new(config, env.location()));
    env.bind(BINDING_NAME, Binding::Chrome(chrome));
    diagnostics.record("install", "attached");
    true
}

static GLOBAL_ENVIRONMENT: Lazy<Mutex<Environment>> = Lazy::new(|| Mutex::new(Environment::new()));

/// Install into the process-wide environment. See [`install`].
pub fn install_global(config: &Config) -> bool {
    let installed = install(&mut GLOBAL_ENVIRONMENT.lock(), config);
    if !installed {
        tracing::debug!(target: TARGET, "global surface already present");
    }
    installed
}

/// The surface installed in the process-wide environment.
pub fn global_chrome() -> Option<Arc<Chrome>> {
    GLOBAL_ENVIRONMENT.lock().chrome()
}

/// Run `f` with exclusive access to the process-wide environment.
pub fn with_global_environment<R>(f: impl FnOnce(&mut Environment) -> R) -> R {
    f(&mut GLOBAL_ENVIRONMENT.lock())
}
