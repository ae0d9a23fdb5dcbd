//! Callback URL canonicalization and parsing.
//!
//! Callback URLs reach the client in three dialects: the IdP's own scheme
//! (intercepted in a WebView), plain https (browser session return), and the
//! host app's scheme (OS deep-link re-entry). [`canonicalize_url`] maps all
//! three onto https so one standard parse handles them; it is the single
//! canonicalization point shared by the parser, the deep-link matcher, and
//! the WebView bridge.
//!
//! [`parse_callback`] turns a callback URL into a validated authorization
//! code. The decision order is load-bearing and must not be rearranged:
//!
//! 1. `error` present: upstream failure, surfaced verbatim.
//! 2. `state` missing or not the expected value: CSRF failure, even when a
//!    code is present.
//! 3. `code` missing or empty: malformed success.
//! 4. Otherwise: success.
//!
//! Query parameter names are matched case-insensitively throughout; the IdP
//! is not consistent about casing.

use url::Url;

use crate::error::{ProtocolError, Result};

/// A validated authorization code callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCode {
    /// The authorization code, exactly as the IdP returned it.
    pub code: String,
    /// The state echoed by the IdP (always the expected value on success).
    pub state: String,
}

/// Replace the scheme of `url` with `scheme`, leaving the rest untouched.
///
/// URLs without a `://` separator are returned unchanged.
pub fn with_scheme(url: &str, scheme: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => format!("{scheme}://{rest}"),
        None => url.to_string(),
    }
}

/// Map a callback URL onto https so standard URL parsing applies.
///
/// http and https URLs pass through unchanged; any other scheme (the IdP's
/// native scheme, the host app's scheme) is swapped for https.
pub fn canonicalize_url(raw: &str) -> String {
    match raw.split_once("://") {
        Some((scheme, _))
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") =>
        {
            raw.to_string()
        }
        Some(_) => with_scheme(raw, "https"),
        None => raw.to_string(),
    }
}

/// Look up a query parameter by case-insensitive name.
///
/// Returns the first match, percent-decoded.
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.into_owned())
}

/// Parse a callback URL against the state issued for this attempt.
///
/// Pure and idempotent: parsing the same URL twice gives the same result and
/// has no side effects.
///
/// # Errors
///
/// - [`ProtocolError::Upstream`] when the IdP signalled an error.
/// - [`ProtocolError::StateMismatch`] when `state` is absent or differs from
///   `expected_state`.
/// - [`ProtocolError::MissingCode`] when no non-empty `code` is present.
/// - [`ProtocolError::UrlParse`] when the URL itself does not parse.
pub fn parse_callback(raw_url: &str, expected_state: &str) -> Result<AuthCode> {
    let url = Url::parse(&canonicalize_url(raw_url))?;

    if let Some(code) = query_param(&url, "error") {
        let description = query_param(&url, "error_description");
        return Err(ProtocolError::Upstream { code, description });
    }

    let state = match query_param(&url, "state") {
        Some(state) if state == expected_state => state,
        _ => return Err(ProtocolError::StateMismatch),
    };

    let code = match query_param(&url, "code") {
        Some(code) if !code.is_empty() => code,
        _ => return Err(ProtocolError::MissingCode),
    };

    Ok(AuthCode { code, state })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
