//! Companion-app scheme and package table.
//!
//! The IDS Hub companion app registers a different URL scheme and package
//! identifier per environment. [`AppSchemeTable`] carries both pairs, maps an
//! [`Environment`] to the right one, and owns environment scheme
//! substitution: URLs that arrive carrying the *other* environment's scheme
//! (the IdP occasionally emits production-scheme links on staging and vice
//! versa) are rewritten before being handed to an OS-level opener. Every
//! opener hand-off in the flow layer goes through [`AppSchemeTable::substitute_env`].

use serde::{Deserialize, Serialize};

use crate::config::Environment;

/// One environment's companion-app identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppScheme {
    /// URL scheme the app registers (iOS-style detection handle).
    pub scheme: String,
    /// Package identifier (Android-style detection handle).
    pub package: String,
}

/// Per-environment companion-app scheme/package pairs.
///
/// Defaults match the published IDS Hub app identifiers; callers may override
/// individual fields before the orchestrator is constructed. The table is
/// immutable once handed to the flow layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSchemeTable {
    /// Production app identifiers.
    pub production: AppScheme,
    /// Staging app identifiers.
    pub staging: AppScheme,
}

impl Default for AppSchemeTable {
    fn default() -> Self {
        Self {
            production: AppScheme {
                scheme: "idshub".to_string(),
                package: "org.idshub.app".to_string(),
            },
            staging: AppScheme {
                scheme: "idshub-test".to_string(),
                package: "org.idshub.app.staging".to_string(),
            },
        }
    }
}

impl AppSchemeTable {
    /// Create a table with the published defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The scheme/package pair for the given environment.
    pub fn for_env(&self, env: Environment) -> &AppScheme {
        match env {
            Environment::Production => &self.production,
            Environment::Staging => &self.staging,
        }
    }

    /// Override the URL scheme for one environment.
    pub fn with_scheme(mut self, env: Environment, scheme: impl Into<String>) -> Self {
        self.entry_mut(env).scheme = scheme.into();
        self
    }

    /// Override the package identifier for one environment.
    pub fn with_package(mut self, env: Environment, package: impl Into<String>) -> Self {
        self.entry_mut(env).package = package.into();
        self
    }

    /// The bare `scheme://` URL used by the can-open-URL detection heuristic.
    pub fn probe_url(&self, env: Environment) -> String {
        format!("{}://", self.for_env(env).scheme)
    }

    /// Rewrite `url` so it carries the active environment's scheme.
    ///
    /// Only a URL whose scheme is exactly the *other* environment's is
    /// rewritten (matched case-insensitively, including the `://` separator,
    /// so `idshub://` never matches inside `idshub-test://`). Anything else
    /// is returned unchanged.
    pub fn substitute_env(&self, url: &str, active: Environment) -> String {
        let (from, to) = match active {
            Environment::Production => (&self.staging.scheme, &self.production.scheme),
            Environment::Staging => (&self.production.scheme, &self.staging.scheme),
        };
        let prefix = format!("{from}://");
        match url.get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(&prefix) => {
                format!("{to}://{}", &url[prefix.len()..])
            }
            _ => url.to_string(),
        }
    }

    fn entry_mut(&mut self, env: Environment) -> &mut AppScheme {
        match env {
            Environment::Production => &mut self.production,
            Environment::Staging => &mut self.staging,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
