//! Browser launch strategy.
//!
//! Opens the authorization URL in a system browser auth session and waits
//! for the callback. Browsers report back in more than one way: some hand
//! the callback URL straight out of the session, some close silently and
//! let the OS deliver the callback as a deep link, and some can only say
//! "the user closed me". The strategy races the session's own outcome
//! against the deep-link listener and the attempt timeout, taking whichever
//! produces a callback first. Only an explicit user cancel or a session
//! that fails to open at all ends the attempt early.

use std::time::Duration;

use idsbridge_protocol::callback::parse_callback;
use idsbridge_protocol::config::AuthConfig;
use idsbridge_protocol::outcome::{AuthGrant, AuthSession};

use crate::error::{FlowError, Result};
use crate::listener::{CallbackListener, CALLBACK_TIMEOUT_SECS};
use crate::platform::{BrowserSessionOutcome, Platform};

/// One attempt's trip through the system browser.
pub(crate) struct BrowserLaunch<'a> {
    platform: &'a dyn Platform,
    config: &'a AuthConfig,
}

impl<'a> BrowserLaunch<'a> {
    pub(crate) fn new(platform: &'a dyn Platform, config: &'a AuthConfig) -> Self {
        Self { platform, config }
    }

    /// Run the attempt to completion.
    pub(crate) async fn run(&self, session: &AuthSession) -> Result<AuthGrant> {
        let return_scheme = self.config.host_scheme()?.to_string();

        // Listener first: a fast IdP can bounce back while the session call
        // is still unwinding.
        let listener = CallbackListener::arm(
            self.platform.deep_links(),
            &self.config.redirect_uri,
            &session.state,
        );
        let initial = match self.platform.initial_url().await {
            Ok(link) => link,
            Err(err) => {
                tracing::debug!(error = %err, "initial link probe failed");
                None
            }
        };

        tracing::info!(session = %session.id, "opening browser auth session");
        let wait = listener.wait(initial, Duration::from_secs(CALLBACK_TIMEOUT_SECS));
        tokio::pin!(wait);
        let browser = self
            .platform
            .open_auth_session(&session.auth_url, &return_scheme);
        tokio::pin!(browser);

        let callback_url = tokio::select! {
            resolved = &mut wait => resolved?,
            outcome = &mut browser => match outcome {
                Ok(BrowserSessionOutcome::Success { url: Some(url) }) => {
                    tracing::debug!(session = %session.id, "browser session returned the callback directly");
                    url
                }
                Ok(BrowserSessionOutcome::Cancelled) => {
                    tracing::info!(session = %session.id, "browser session cancelled by user");
                    return Err(FlowError::Cancelled);
                }
                Ok(outcome) => {
                    // Success without a URL, a dismissal, or an opaque close
                    // all leave room for the callback to still arrive as a
                    // deep link; keep the listener running.
                    tracing::debug!(session = %session.id, ?outcome, "browser session closed, waiting for deep link");
                    (&mut wait).await?
                }
                Err(err) => {
                    tracing::warn!(session = %session.id, error = %err, "browser session failed to open");
                    return Err(err.into());
                }
            },
        };

        let code = parse_callback(&callback_url, &session.state)?;
        Ok(session.grant_for(code))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
