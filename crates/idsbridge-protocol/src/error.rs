//! Error types for the protocol crate.
//!
//! All protocol operations surface errors through [`ProtocolError`], which is
//! the single error type for this crate. Each variant carries enough context
//! for callers to decide how to handle the failure.

/// Unified error type for the idsbridge protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Configuration is missing or malformed. Fatal: flow operations must
    /// fail fast on this rather than proceed with defaults.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The identity provider returned an error on a callback URL. The code
    /// and description are surfaced verbatim.
    #[error("{}", .description.as_deref().unwrap_or(.code))]
    Upstream {
        /// The IdP error code (e.g. `access_denied`).
        code: String,
        /// Human-readable description, when the IdP supplied one.
        description: Option<String>,
    },

    /// The `state` parameter on a callback did not match the value issued
    /// for this attempt. This is the CSRF signal: a callback with a
    /// mismatched (or missing) state is never treated as success, even when
    /// it carries an authorization code.
    #[error("invalid state")]
    StateMismatch,

    /// The callback carried no authorization code (and no error either).
    #[error("no authorization code")]
    MissingCode,

    /// URL parsing error.
    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The system CSPRNG failed to produce random bytes.
    #[error("random generator failure")]
    Rng,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_config() {
        let err = ProtocolError::InvalidConfig {
            reason: "missing client_id".to_string(),
        };
        assert_eq!(err.to_string(), "invalid configuration: missing client_id");
    }

    #[test]
    fn error_display_upstream_prefers_description() {
        let err = ProtocolError::Upstream {
            code: "access_denied".to_string(),
            description: Some("User cancelled the request".to_string()),
        };
        assert_eq!(err.to_string(), "User cancelled the request");
    }

    #[test]
    fn error_display_upstream_falls_back_to_code() {
        let err = ProtocolError::Upstream {
            code: "server_error".to_string(),
            description: None,
        };
        assert_eq!(err.to_string(), "server_error");
    }

    #[test]
    fn error_display_state_mismatch() {
        assert_eq!(ProtocolError::StateMismatch.to_string(), "invalid state");
    }

    #[test]
    fn error_display_missing_code() {
        assert_eq!(
            ProtocolError::MissingCode.to_string(),
            "no authorization code"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolError>();
    }
}
