//! Callback listener.
//!
//! Every launch strategy follows the same discipline: subscribe to the deep
//! link stream *first*, then hand control to the app or browser. The armed
//! [`CallbackListener`] buffers any callback that arrives while the launch
//! is still in flight, so even an instant bounce-back cannot be lost.
//!
//! A listener belongs to exactly one attempt. [`CallbackListener::wait`]
//! consumes it, and dropping the listener releases its bus subscription, so
//! no resolved attempt keeps receiving links.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use idsbridge_protocol::callback::{canonicalize_url, query_param};

use crate::error::{FlowError, Result};

/// How long an attempt waits for a callback before giving up.
///
/// Both launch paths hand control to another app, and the user may sit on
/// the IdP's login screen for a while. Five minutes absorbs a real sign-in
/// without keeping abandoned attempts alive forever.
pub(crate) const CALLBACK_TIMEOUT_SECS: u64 = 300;

/// An armed subscription waiting for this attempt's callback.
pub(crate) struct CallbackListener {
    rx: broadcast::Receiver<String>,
    redirect_uri: String,
    expected_state: String,
}

impl CallbackListener {
    /// Arm a listener for one attempt.
    ///
    /// Call this *before* launching anything that could produce a callback.
    pub(crate) fn arm(
        rx: broadcast::Receiver<String>,
        redirect_uri: impl Into<String>,
        expected_state: impl Into<String>,
    ) -> Self {
        Self {
            rx,
            redirect_uri: redirect_uri.into(),
            expected_state: expected_state.into(),
        }
    }

    /// Whether an inbound link is this attempt's callback.
    ///
    /// Shape first: the link must carry our redirect URI or an authorization
    /// `code` parameter. Then state demux: a link carrying a *different*
    /// state belongs to another in-flight attempt and is skipped. A link
    /// carrying no readable state at all is accepted; the callback parser
    /// will reject it loudly instead of this filter dropping it silently.
    fn matches(&self, url: &str) -> bool {
        if !url.contains(&self.redirect_uri) && !url.contains("code=") {
            return false;
        }
        match url::Url::parse(&canonicalize_url(url)) {
            Ok(parsed) => match query_param(&parsed, "state") {
                Some(state) => state == self.expected_state,
                None => true,
            },
            Err(_) => true,
        }
    }

    /// Wait for this attempt's callback, up to `timeout`.
    ///
    /// `initial` is the cold-start link, if any: on some platforms the app
    /// is relaunched *by* the callback, so the link predates the bus and is
    /// checked before anything else.
    ///
    /// Consumes the listener; returning (or dropping) releases the bus
    /// subscription.
    pub(crate) async fn wait(
        mut self,
        initial: Option<String>,
        timeout: Duration,
    ) -> Result<String> {
        if let Some(url) = initial {
            if self.matches(&url) {
                tracing::debug!(url = %url, "callback arrived as launch link");
                return Ok(url);
            }
            tracing::trace!(url = %url, "launch link is not our callback");
        }

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "callback wait timed out");
                    return Err(FlowError::Timeout { timeout_secs: timeout.as_secs() });
                }
                received = self.rx.recv() => match received {
                    Ok(url) if self.matches(&url) => {
                        tracing::debug!(url = %url, "callback received");
                        return Ok(url);
                    }
                    Ok(url) => {
                        tracing::trace!(url = %url, "deep link is not our callback, still waiting");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "deep link listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        return Err(FlowError::ListenerClosed);
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
