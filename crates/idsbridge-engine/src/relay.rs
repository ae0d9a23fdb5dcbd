//! Backend code relay.
//!
//! The mobile client never completes the code exchange itself: the client
//! secret lives on the app's backend, and IDS Hub's PKCE check happens
//! there too. [`CodeRelay`] forwards the authorization code and verifier to
//! that backend and hands back whatever JSON it returns, treating the
//! payload as opaque. No tokens are interpreted or persisted here.

use reqwest::StatusCode;
use serde::Deserialize;

use idsbridge_protocol::config::AuthConfig;
use idsbridge_protocol::error::ProtocolError;

use crate::error::{FlowError, Result};

/// OAuth-style error body the backend may relay from the IdP.
#[derive(Debug, Deserialize)]
struct ExchangeErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the app backend's token-exchange endpoint.
pub struct CodeRelay {
    token_url: String,
    client_id: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl CodeRelay {
    /// Build a relay for the configured token endpoint.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Forward a validated code and its verifier to the backend.
    ///
    /// Posts `code`, `code_verifier`, `redirect_uri`, and `client_id` as a
    /// form; the backend adds the secret and completes the exchange.
    ///
    /// # Errors
    ///
    /// OAuth-style error bodies surface as upstream errors, anything else
    /// the endpoint rejects as a transport error, and connection failures
    /// as [`FlowError::Http`].
    pub async fn relay_code(&self, code: &str, code_verifier: &str) -> Result<serde_json::Value> {
        // Codes and verifiers stay out of the logs.
        tracing::debug!(url = %self.token_url, "relaying authorization code");

        let form = [
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Self::parse_exchange_response(status, &body)
    }

    /// Interpret the backend's response.
    fn parse_exchange_response(status: StatusCode, body: &str) -> Result<serde_json::Value> {
        if status.is_success() {
            let payload = serde_json::from_str(body)?;
            tracing::debug!("code relay succeeded");
            return Ok(payload);
        }

        match serde_json::from_str::<ExchangeErrorBody>(body) {
            Ok(oauth_err) => {
                tracing::warn!(code = %oauth_err.error, "code relay rejected upstream");
                Err(ProtocolError::Upstream {
                    code: oauth_err.error,
                    description: oauth_err.error_description,
                }
                .into())
            }
            Err(_) => Err(FlowError::Transport {
                operation: "relay_code".to_string(),
                reason: format!("HTTP {status}: {body}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_passes_through_as_json() {
        let body = r#"{"access_token":"at-1","token_type":"Bearer","expires_in":3600}"#;
        let payload = CodeRelay::parse_exchange_response(StatusCode::OK, body).unwrap();
        assert_eq!(payload["access_token"], "at-1");
        assert_eq!(payload["expires_in"], 3600);
    }

    #[test]
    fn oauth_error_body_maps_to_upstream() {
        let body = r#"{"error":"invalid_grant","error_description":"code expired"}"#;
        let err = CodeRelay::parse_exchange_response(StatusCode::BAD_REQUEST, body).unwrap_err();
        match err {
            FlowError::Protocol(ProtocolError::Upstream { code, description }) => {
                assert_eq!(code, "invalid_grant");
                assert_eq!(description.as_deref(), Some("code expired"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn oauth_error_without_description_falls_back_to_the_code() {
        let body = r#"{"error":"invalid_client"}"#;
        let err = CodeRelay::parse_exchange_response(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(err.to_string(), "invalid_client");
    }

    #[test]
    fn non_oauth_failure_is_a_transport_error() {
        let err =
            CodeRelay::parse_exchange_response(StatusCode::BAD_GATEWAY, "upstream unavailable")
                .unwrap_err();
        match err {
            FlowError::Transport { operation, reason } => {
                assert_eq!(operation, "relay_code");
                assert!(reason.contains("502"));
                assert!(reason.contains("upstream unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_success_body_is_a_json_error() {
        let err = CodeRelay::parse_exchange_response(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, FlowError::Json(_)));
    }

    #[test]
    fn relay_is_built_from_config() {
        let config = crate::testutil::test_config();
        let relay = CodeRelay::new(&config);
        assert_eq!(relay.token_url, "https://api.example.org/oauth/token");
        assert_eq!(relay.client_id, "sp-mobile");
    }
}
