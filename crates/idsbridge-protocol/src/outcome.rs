//! Flow outcome and per-attempt session types.
//!
//! Every authentication attempt resolves to exactly one of three shapes:
//! an authorization code ([`AuthGrant::Code`]), a deferred hand-off to an
//! embedded WebView ([`AuthGrant::WebView`]), or an error (the flow layer's
//! error type). The sum types here make illegal mixtures unrepresentable;
//! there is no "success with missing fields".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorize::AcrValue;
use crate::callback::AuthCode;

// ---------------------------------------------------------------------------
// Paths and grants
// ---------------------------------------------------------------------------

/// Which transport an attempt was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPath {
    /// Hand-off to the companion app via deep link.
    NativeApp,
    /// System browser auth session.
    Browser,
    /// Deferred to an embedded WebView driven by the caller.
    WebView,
}

impl std::fmt::Display for FlowPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NativeApp => write!(f, "native_app"),
            Self::Browser => write!(f, "browser"),
            Self::WebView => write!(f, "web_view"),
        }
    }
}

/// Everything an embedder needs to run the authentication hop in its own
/// WebView instead of handing off to a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebViewAuthParams {
    /// The IdP authorization URL to load.
    pub auth_url: String,
    /// The redirect URI terminal navigations are matched against.
    pub redirect_uri: String,
    /// The state token issued for this attempt.
    pub state: String,
    /// The PKCE verifier to forward with the eventual code.
    pub code_verifier: String,
    /// The ACR that was requested.
    pub acr: AcrValue,
    /// Whether the companion app was detected on this device.
    pub use_web_view: bool,
}

/// Successful resolution of an authentication attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthGrant {
    /// An authorization code came back and was validated against this
    /// attempt's state. The verifier rides along so the caller can forward
    /// code and verifier to the exchange endpoint together.
    Code {
        /// The authorization code.
        code: String,
        /// The validated state.
        state: String,
        /// The PKCE verifier issued for this attempt.
        code_verifier: String,
    },

    /// The attempt needs an embedded browser step the caller must render;
    /// authentication continues through a WebView session built from the
    /// carried parameters.
    WebView(WebViewAuthParams),
}

// ---------------------------------------------------------------------------
// Per-attempt session
// ---------------------------------------------------------------------------

/// State for a single authentication attempt.
///
/// Created per call and dropped when the attempt resolves; never persisted.
/// Concurrent attempts each hold their own session, and inbound callbacks are
/// demultiplexed by comparing their `state` against each session's value.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Identifier for log correlation.
    pub id: Uuid,
    /// The state token issued for this attempt.
    pub state: String,
    /// The PKCE verifier issued for this attempt.
    pub code_verifier: String,
    /// The ACR requested from the IdP.
    pub acr: AcrValue,
    /// The fully built authorization URL.
    pub auth_url: String,
    /// The transport this attempt was routed to.
    pub path: FlowPath,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
}

impl AuthSession {
    /// Start a session for one attempt.
    pub fn begin(
        state: String,
        code_verifier: String,
        acr: AcrValue,
        auth_url: String,
        path: FlowPath,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            state,
            code_verifier,
            acr,
            auth_url,
            path,
            started_at: Utc::now(),
        }
    }

    /// Combine a validated callback with this session's verifier into the
    /// final grant.
    pub fn grant_for(&self, callback: AuthCode) -> AuthGrant {
        AuthGrant::Code {
            code: callback.code,
            state: callback.state,
            code_verifier: self.code_verifier.clone(),
        }
    }

    /// The embedder-facing parameter block for this attempt.
    pub fn web_view_params(&self, redirect_uri: &str, use_web_view: bool) -> WebViewAuthParams {
        WebViewAuthParams {
            auth_url: self.auth_url.clone(),
            redirect_uri: redirect_uri.to_string(),
            state: self.state.clone(),
            code_verifier: self.code_verifier.clone(),
            acr: self.acr,
            use_web_view,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session(path: FlowPath) -> AuthSession {
        AuthSession::begin(
            "state-1".to_string(),
            "verifier-1".to_string(),
            AcrValue::MobileApp,
            "https://idp.idshub.example/authorize?state=state-1".to_string(),
            path,
        )
    }

    #[test]
    fn begin_stamps_id_and_time() {
        let session = test_session(FlowPath::NativeApp);
        assert!(!session.id.is_nil());
        assert!(session.started_at <= Utc::now());
        assert_eq!(session.path, FlowPath::NativeApp);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let a = test_session(FlowPath::Browser);
        let b = test_session(FlowPath::Browser);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn grant_carries_the_session_verifier() {
        let session = test_session(FlowPath::NativeApp);
        let grant = session.grant_for(AuthCode {
            code: "abc".to_string(),
            state: "state-1".to_string(),
        });
        match grant {
            AuthGrant::Code {
                code,
                state,
                code_verifier,
            } => {
                assert_eq!(code, "abc");
                assert_eq!(state, "state-1");
                assert_eq!(code_verifier, "verifier-1");
            }
            other => panic!("unexpected grant: {other:?}"),
        }
    }

    #[test]
    fn web_view_params_copy_session_fields() {
        let session = test_session(FlowPath::WebView);
        let params = session.web_view_params("no.example.app://auth/idshub/callback", true);
        assert_eq!(params.auth_url, session.auth_url);
        assert_eq!(params.state, "state-1");
        assert_eq!(params.code_verifier, "verifier-1");
        assert_eq!(params.acr, AcrValue::MobileApp);
        assert!(params.use_web_view);
    }

    #[test]
    fn flow_path_display() {
        assert_eq!(FlowPath::NativeApp.to_string(), "native_app");
        assert_eq!(FlowPath::Browser.to_string(), "browser");
        assert_eq!(FlowPath::WebView.to_string(), "web_view");
    }

    #[test]
    fn auth_grant_serde_round_trip() {
        let grant = AuthGrant::Code {
            code: "c".to_string(),
            state: "s".to_string(),
            code_verifier: "v".to_string(),
        };
        let json = serde_json::to_string(&grant).unwrap();
        assert!(json.contains("\"code\""));
        let back: AuthGrant = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, AuthGrant::Code { .. }));
    }
}
