//! Authorization URL and deep-link construction.
//!
//! Two URL shapes are built here: the IdP authorization URL that every flow
//! starts from, and the companion-app deep link that wraps it when the
//! native-app path is taken. Both are pure string construction over
//! [`url::Url`]; the only failure mode is a malformed base URL, surfaced as a
//! configuration error.
//!
//! Note that the authorization URL carries no PKCE `code_challenge`: IDS Hub
//! completes PKCE at the token endpoint, so the verifier travels with the
//! grant to the app backend instead of onto the authorize query string.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{ProtocolError, Result};

/// Query parameter carrying the wrapped authorization URL in an app deep link.
pub const PARAM_SP_URL: &str = "spUrl";

/// Query parameter carrying the success callback in an app deep link.
pub const PARAM_SUCCESS_URL: &str = "successURL";

/// Query parameter carrying the failure callback in an app deep link.
pub const PARAM_FAILURE_URL: &str = "failureURL";

/// Authority and path of the companion app's authorize deep link.
const APP_AUTHORIZE_BASE: &str = "idshub/authorize";

/// Error code IDS Hub returns when the user declines, and the code tagged
/// onto the failure callback URL so a decline in the app parses the same way.
pub const ERROR_ACCESS_DENIED: &str = "access_denied";

/// Description tagged onto the failure callback URL.
const FAILURE_ERROR_DESCRIPTION: &str = "authentication was declined in the IDS Hub app";

// ---------------------------------------------------------------------------
// ACR values
// ---------------------------------------------------------------------------

/// Authentication context class reference requested from IDS Hub.
///
/// The wire tokens are IdP-defined and treated as opaque by everything else;
/// which one is requested depends solely on whether the companion app was
/// detected on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcrValue {
    /// Baseline browser-based authentication.
    Low,
    /// Authentication through the IDS Hub app on this device.
    MobileApp,
}

impl AcrValue {
    /// The token sent as `acr_values`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "urn:idshub:acr:low",
            Self::MobileApp => "urn:idshub:acr:mobile-app",
        }
    }
}

impl std::fmt::Display for AcrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// URL builders
// ---------------------------------------------------------------------------

/// Build the IdP authorization URL for one attempt.
///
/// The query carries exactly `response_type=code`, `client_id`,
/// `redirect_uri`, `scope` (space-joined), `state`, `acr_values`, and
/// `ui_locales` (space-joined), appended to whatever query the configured
/// endpoint already has.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidConfig`] if the configured authorization
/// endpoint is not a valid URL.
pub fn build_authorize_url(config: &AuthConfig, acr: AcrValue, state: &str) -> Result<String> {
    let mut url = Url::parse(&config.authorize_url).map_err(|e| ProtocolError::InvalidConfig {
        reason: format!("authorize_url is not a valid URL: {e}"),
    })?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &config.client_id);
        params.append_pair("redirect_uri", &config.redirect_uri);
        params.append_pair("scope", &config.scopes.join(" "));
        params.append_pair("state", state);
        params.append_pair("acr_values", acr.as_str());
        params.append_pair("ui_locales", &config.ui_locales.join(" "));
    }

    Ok(url.to_string())
}

/// Build the companion-app deep link wrapping one authorization attempt.
///
/// Shape: `<scheme>://idshub/authorize?spUrl=..&successURL=..&failureURL=..`
/// with all three values percent-encoded. `scheme` is the active
/// environment's entry in the scheme table.
///
/// # Errors
///
/// Returns [`ProtocolError::UrlParse`] if `scheme` cannot head a URL.
pub fn build_app_deep_link(
    scheme: &str,
    auth_url: &str,
    success_url: &str,
    failure_url: &str,
) -> Result<String> {
    let mut url = Url::parse(&format!("{scheme}://{APP_AUTHORIZE_BASE}"))?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair(PARAM_SP_URL, auth_url);
        params.append_pair(PARAM_SUCCESS_URL, success_url);
        params.append_pair(PARAM_FAILURE_URL, failure_url);
    }

    Ok(url.to_string())
}

/// Derive the failure callback URL from the redirect URI.
///
/// The companion app redirects here when the user declines; the error tag
/// makes that hand-back parse as an upstream error instead of a malformed
/// success.
///
/// # Errors
///
/// Returns [`ProtocolError::UrlParse`] if the redirect URI does not parse.
pub fn failure_redirect(redirect_uri: &str) -> Result<String> {
    let mut url = Url::parse(redirect_uri)?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("error", ERROR_ACCESS_DENIED);
        params.append_pair("error_description", FAILURE_ERROR_DESCRIPTION);
    }

    Ok(url.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
