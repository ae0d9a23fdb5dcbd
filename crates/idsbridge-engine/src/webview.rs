//! WebView interception bridge.
//!
//! Some hosts render the IdP's authorization page in an embedded web surface
//! instead of handing off to the native-app strategy. Inside that surface
//! the IdP still behaves as if a whole device were listening: at some point
//! it redirects to its own native scheme to pull the IDS Hub app into the
//! foreground, passing `successURL`/`failureURL` parameters that say where
//! the app should send the user afterwards. Left alone, those URLs point
//! back into IdP web land and the embedded surface never hears from the
//! flow again.
//!
//! [`WebViewAuthSession`] sits between the surface and the OS. The embedder
//! feeds it every navigation attempt and every inbound deep link, renders
//! what it is told to render, and opens nothing itself:
//!
//! - navigations to the IdP scheme are vetoed, their callback parameters
//!   rewritten to host-scheme resume URLs, and the rewritten link handed to
//!   the OS opener so the companion app can take over;
//! - the app later bounces back via a resume deep link carrying the saved
//!   callback URL, which the embedder loads back into the surface;
//! - a navigation reaching the redirect URI terminates the session with an
//!   [`WebViewOutcome`] for the embedder's hooks.

use std::sync::Arc;

use url::Url;

use idsbridge_protocol::authorize::{ERROR_ACCESS_DENIED, PARAM_FAILURE_URL, PARAM_SUCCESS_URL};
use idsbridge_protocol::callback::{canonicalize_url, parse_callback, query_param, with_scheme};
use idsbridge_protocol::config::{AuthConfig, Environment};
use idsbridge_protocol::error::ProtocolError;
use idsbridge_protocol::outcome::WebViewAuthParams;
use idsbridge_protocol::schemes::AppSchemeTable;

use crate::error::Result;
use crate::platform::Platform;

// ---------------------------------------------------------------------------
// Embedder-facing decisions
// ---------------------------------------------------------------------------

/// What the embedder should do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the surface load the URL; ordinary IdP page traffic.
    Load,
    /// Veto the load. The bridge has handed the URL (possibly rewritten) to
    /// the OS opener instead.
    Cancel,
    /// Veto the load; the flow is over. Map the outcome onto the embedder's
    /// success/cancel/error hooks and tear the surface down.
    Complete(WebViewOutcome),
}

/// What the embedder should do with an inbound deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkDecision {
    /// The companion app handed control back. Load the carried URL into the
    /// surface to continue the flow.
    Resume(String),
    /// The link was a terminal callback; the flow is over.
    Complete(WebViewOutcome),
    /// Not ours. Leave the surface alone.
    Ignored,
}

/// Terminal result of a WebView-driven attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebViewOutcome {
    /// The callback carried a code matching this session's state.
    Authorized {
        /// The authorization code.
        code: String,
        /// The validated state.
        state: String,
    },
    /// The IdP reported an error other than a user decline.
    Failed {
        /// Human-readable reason, from `error_description` when present.
        message: String,
    },
    /// The user declined in the IdP app or browser page.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Bridge session
// ---------------------------------------------------------------------------

/// One embedded rendering session of the authentication hop.
///
/// Built from the [`WebViewAuthParams`] that `prepare_auth` returned. The
/// embedder loads [`start_url`](Self::start_url), then routes every
/// navigation attempt through [`handle_navigation`](Self::handle_navigation)
/// and every OS deep link through
/// [`handle_deep_link`](Self::handle_deep_link).
pub struct WebViewAuthSession {
    params: WebViewAuthParams,
    environment: Environment,
    channel: String,
    host_scheme: String,
    schemes: AppSchemeTable,
    platform: Arc<dyn Platform>,
    saved_success_url: Option<String>,
    saved_failure_url: Option<String>,
    waiting_for_app: bool,
    resumed: bool,
    current_url: String,
}

impl WebViewAuthSession {
    /// Bind prepared parameters to a configuration and platform.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the redirect URI carries no scheme;
    /// the resume URLs the bridge mints live under that scheme.
    pub fn new(
        params: WebViewAuthParams,
        config: &AuthConfig,
        schemes: AppSchemeTable,
        platform: Arc<dyn Platform>,
    ) -> Result<Self> {
        let host_scheme = params
            .redirect_uri
            .split_once("://")
            .map(|(scheme, _)| scheme.to_string())
            .ok_or_else(|| ProtocolError::InvalidConfig {
                reason: "redirect_uri must be of the form scheme://path".to_string(),
            })?;

        let current_url = params.auth_url.clone();
        Ok(Self {
            params,
            environment: config.environment,
            channel: config.channel.clone(),
            host_scheme,
            schemes,
            platform,
            saved_success_url: None,
            saved_failure_url: None,
            waiting_for_app: false,
            resumed: false,
            current_url,
        })
    }

    /// The URL the embedder should load first.
    pub fn start_url(&self) -> &str {
        &self.params.auth_url
    }

    /// The parameters this session was built from.
    pub fn params(&self) -> &WebViewAuthParams {
        &self.params
    }

    /// Whether control is currently with the companion app.
    pub fn is_waiting_for_app(&self) -> bool {
        self.waiting_for_app
    }

    /// Whether the companion app has handed control back at least once.
    pub fn has_resumed(&self) -> bool {
        self.resumed
    }

    /// The URL the surface is currently on, as far as the bridge knows.
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// The success callback saved off the IdP's hand-off link, once seen.
    pub fn saved_success_url(&self) -> Option<&str> {
        self.saved_success_url.as_deref()
    }

    /// The failure callback saved off the IdP's hand-off link, once seen.
    pub fn saved_failure_url(&self) -> Option<&str> {
        self.saved_failure_url.as_deref()
    }

    /// Decide a navigation attempt inside the embedded surface.
    ///
    /// # Errors
    ///
    /// Fails when the OS opener rejects a hand-off, or when a terminal
    /// callback is malformed (missing code, foreign state).
    pub async fn handle_navigation(&mut self, url: &str) -> Result<NavigationDecision> {
        if self.is_idp_scheme(url) {
            return self.intercept_idp_navigation(url).await;
        }

        if self.matches_redirect(url) {
            tracing::debug!(url = %url, "web view reached the redirect URI");
            return Ok(NavigationDecision::Complete(self.terminal_outcome(url)?));
        }

        self.current_url = url.to_string();
        Ok(NavigationDecision::Load)
    }

    /// Decide an inbound OS deep link while this session is rendering.
    ///
    /// # Errors
    ///
    /// Fails when a terminal callback is malformed (missing code, foreign
    /// state).
    pub fn handle_deep_link(&mut self, url: &str) -> Result<DeepLinkDecision> {
        let resume_prefix = format!("{}://auth/{}/resume", self.host_scheme, self.channel);
        let on_resume_path = url
            .get(..resume_prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&resume_prefix));

        if on_resume_path {
            let parsed = Url::parse(&canonicalize_url(url))?;
            let Some(inner) = query_param(&parsed, "url") else {
                tracing::warn!(url = %url, "resume link without an url parameter");
                return Ok(DeepLinkDecision::Ignored);
            };
            self.waiting_for_app = false;
            self.resumed = true;
            self.current_url = inner.clone();
            tracing::info!("companion app handed control back to the surface");
            return Ok(DeepLinkDecision::Resume(inner));
        }

        if url.contains("code=") || self.matches_redirect(url) {
            tracing::debug!(url = %url, "deep link is a terminal callback");
            return Ok(DeepLinkDecision::Complete(self.terminal_outcome(url)?));
        }

        tracing::trace!(url = %url, "deep link not for this session");
        Ok(DeepLinkDecision::Ignored)
    }

    /// Whether a URL is on the IdP's native scheme, either environment's.
    ///
    /// Matching both schemes lets a hand-off minted for the other deployment
    /// still be intercepted; the opener hand-off substitutes it to the
    /// active one.
    fn is_idp_scheme(&self, url: &str) -> bool {
        [Environment::Production, Environment::Staging]
            .into_iter()
            .any(|env| {
                let prefix = self.schemes.probe_url(env);
                url.get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
            })
    }

    /// Whether a URL has come back to the configured redirect URI.
    fn matches_redirect(&self, url: &str) -> bool {
        if url.starts_with(&self.params.redirect_uri) {
            return true;
        }
        let prefix = format!("{}://", self.host_scheme);
        match (
            url.strip_prefix(&prefix),
            self.params.redirect_uri.strip_prefix(&prefix),
        ) {
            (Some(rest), Some(redirect_rest)) => rest.contains(redirect_rest),
            _ => false,
        }
    }

    /// Intercept an IdP-scheme navigation and hand it to the OS.
    async fn intercept_idp_navigation(&mut self, raw: &str) -> Result<NavigationDecision> {
        let parsed = match Url::parse(&canonicalize_url(raw)) {
            Ok(parsed) => parsed,
            Err(err) => {
                // Nothing to rewrite in a link we cannot parse; opening it
                // raw at least lets the app take over.
                tracing::warn!(error = %err, url = %raw, "unparseable IdP link, opening raw");
                self.open_external(raw).await?;
                return Ok(NavigationDecision::Cancel);
            }
        };

        let success = query_param(&parsed, PARAM_SUCCESS_URL);
        let failure = query_param(&parsed, PARAM_FAILURE_URL);

        let host_prefix = format!("{}://", self.host_scheme);
        if success
            .as_deref()
            .is_some_and(|u| u.starts_with(&host_prefix))
        {
            // Already carries host callbacks: rewriting again would nest
            // resume URLs inside resume URLs.
            tracing::debug!("IdP link already rewritten, handing off as-is");
            self.waiting_for_app = true;
            self.open_external(raw).await?;
            return Ok(NavigationDecision::Cancel);
        }

        match (success, failure) {
            (Some(success), Some(failure)) => {
                let rewritten = self.rewrite_idp_link(&parsed);
                self.saved_success_url = Some(success);
                self.saved_failure_url = Some(failure);
                self.waiting_for_app = true;
                tracing::info!("handing off to the companion app with resume callbacks");
                self.open_external(&rewritten).await?;
                Ok(NavigationDecision::Cancel)
            }
            _ => {
                // No callbacks to capture; the link stands on its own.
                tracing::debug!("IdP link without callback parameters, handing off unmodified");
                self.open_external(raw).await?;
                Ok(NavigationDecision::Cancel)
            }
        }
    }

    /// Rebuild an IdP link with its callback parameters pointed at this
    /// host's resume path.
    ///
    /// Parameter names are matched case-insensitively but re-emitted with
    /// their original spelling; everything else on the query is preserved.
    fn rewrite_idp_link(&self, parsed: &Url) -> String {
        let mut rebuilt = parsed.clone();
        rebuilt.set_query(None);
        {
            let mut pairs = rebuilt.query_pairs_mut();
            for (key, value) in parsed.query_pairs() {
                if key.eq_ignore_ascii_case(PARAM_SUCCESS_URL)
                    || key.eq_ignore_ascii_case(PARAM_FAILURE_URL)
                {
                    pairs.append_pair(&key, &self.resume_url(&value));
                } else {
                    pairs.append_pair(&key, &value);
                }
            }
        }
        // Parsing canonicalized the link to https; put the active
        // environment's scheme back for the hand-off.
        with_scheme(
            rebuilt.as_str(),
            &self.schemes.for_env(self.environment).scheme,
        )
    }

    /// The host-scheme URL the companion app bounces back to, wrapping the
    /// IdP's original callback.
    fn resume_url(&self, inner: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(inner.as_bytes()).collect();
        format!(
            "{}://auth/{}/resume?url={}",
            self.host_scheme, self.channel, encoded
        )
    }

    /// Hand a URL to the OS opener, normalized to the active environment.
    async fn open_external(&self, url: &str) -> Result<()> {
        let target = self.schemes.substitute_env(url, self.environment);
        tracing::debug!(url = %target, "opening externally");
        self.platform.open_url(&target).await?;
        Ok(())
    }

    /// Map a terminal callback onto the embedder-facing outcome.
    ///
    /// A user decline (`access_denied`) is a cancel, not an error; other
    /// upstream errors carry their description. Malformed callbacks (foreign
    /// state, missing code) stay hard errors.
    fn terminal_outcome(&self, url: &str) -> Result<WebViewOutcome> {
        match parse_callback(url, &self.params.state) {
            Ok(callback) => Ok(WebViewOutcome::Authorized {
                code: callback.code,
                state: callback.state,
            }),
            Err(ProtocolError::Upstream { code, description }) => {
                if code == ERROR_ACCESS_DENIED {
                    Ok(WebViewOutcome::Cancelled)
                } else {
                    Ok(WebViewOutcome::Failed {
                        message: description.unwrap_or(code),
                    })
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
