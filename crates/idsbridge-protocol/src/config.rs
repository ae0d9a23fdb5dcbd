//! Authentication configuration.
//!
//! [`AuthConfig`] carries everything the flow layer needs to talk to IDS Hub:
//! the target environment, OAuth client identity, endpoint URLs, and request
//! decoration (scopes, UI locales). The configuration is validated once via
//! [`AuthConfig::validate`] and is immutable afterwards; flow operations are
//! constructed from a validated config and never see a half-set one.
//!
//! Configs can be built in code (builder-style `with_*` methods) or loaded
//! from TOML via [`AuthConfig::from_toml_str`] / [`AuthConfig::from_toml_file`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProtocolError, Result};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// The IDS Hub deployment an app talks to.
///
/// The environment selects endpoint defaults upstream of this crate and the
/// companion-app scheme/package pair in
/// [`AppSchemeTable`](crate::schemes::AppSchemeTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// The staging (test) deployment.
    Staging,
    /// The production deployment.
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

/// Configuration for authenticating against IDS Hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Which IDS Hub deployment to use.
    pub environment: Environment,

    /// The OAuth client ID registered with IDS Hub.
    pub client_id: String,

    /// The redirect URI registered for this client. Its scheme is the host
    /// app's own deep-link scheme and is what callback URLs are matched
    /// against.
    pub redirect_uri: String,

    /// The authorization endpoint URL.
    pub authorize_url: String,

    /// The token endpoint URL (the app backend's exchange endpoint).
    pub token_url: String,

    /// The userinfo endpoint URL, when the deployment exposes one. Carried
    /// for backend use; no client-side flow operation calls it.
    #[serde(default)]
    pub userinfo_url: Option<String>,

    /// The scopes to request. Defaults to `["openid"]`.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Preferred UI languages, sent as `ui_locales`. Defaults to `["en"]`.
    #[serde(default = "default_ui_locales")]
    pub ui_locales: Vec<String>,

    /// Channel name used in resume deep-link paths. Defaults to `"idshub"`.
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string()]
}

fn default_ui_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_channel() -> String {
    "idshub".to_string()
}

impl AuthConfig {
    /// Create a configuration with the required fields and defaults for the
    /// rest (`openid` scope, English UI, `idshub` channel).
    pub fn new(
        environment: Environment,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            userinfo_url: None,
            scopes: default_scopes(),
            ui_locales: default_ui_locales(),
            channel: default_channel(),
        }
    }

    /// Set the scopes to request.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the preferred UI locales.
    pub fn with_ui_locales(mut self, locales: Vec<String>) -> Self {
        self.ui_locales = locales;
        self
    }

    /// Set the channel name used in resume deep-link paths.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Set the userinfo endpoint URL.
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = Some(url.into());
        self
    }

    /// Load and validate a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] if the document does not
    /// parse or fails [`AuthConfig::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ProtocolError::InvalidConfig {
            reason: format!("failed to parse TOML config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] if the file cannot be read,
    /// does not parse, or fails [`AuthConfig::validate`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ProtocolError::InvalidConfig {
                reason: format!("failed to read config file: {e}"),
            })?;
        Self::from_toml_str(&content)
    }

    /// Check that every field flow operations rely on is present and well
    /// formed. This is the fail-fast gate: nothing downstream re-validates.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(invalid("client_id must not be empty"));
        }
        if !self.redirect_uri.contains("://") {
            return Err(invalid("redirect_uri must carry a URL scheme"));
        }
        Url::parse(&self.redirect_uri)
            .map_err(|e| invalid(format!("redirect_uri is not a valid URL: {e}")))?;
        Url::parse(&self.authorize_url)
            .map_err(|e| invalid(format!("authorize_url is not a valid URL: {e}")))?;
        Url::parse(&self.token_url)
            .map_err(|e| invalid(format!("token_url is not a valid URL: {e}")))?;
        if let Some(ref userinfo) = self.userinfo_url {
            Url::parse(userinfo)
                .map_err(|e| invalid(format!("userinfo_url is not a valid URL: {e}")))?;
        }
        if self.scopes.is_empty() {
            return Err(invalid("scopes must not be empty"));
        }
        if self.ui_locales.is_empty() {
            return Err(invalid("ui_locales must not be empty"));
        }
        if self.channel.trim().is_empty() {
            return Err(invalid("channel must not be empty"));
        }
        Ok(())
    }

    /// The host app's own URL scheme, derived from the redirect URI.
    ///
    /// Resume deep links and rewritten callback URLs all live under this
    /// scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] if the redirect URI carries
    /// no scheme (validation rejects such configs up front).
    pub fn host_scheme(&self) -> Result<&str> {
        self.redirect_uri
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| invalid("redirect_uri must carry a URL scheme"))
    }
}

fn invalid(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidConfig {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
