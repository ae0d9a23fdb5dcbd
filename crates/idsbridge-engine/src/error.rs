//! Error types for the engine crate.
//!
//! All flow operations surface errors through [`FlowError`], which is the
//! single error type for this crate. Protocol-level failures (CSRF, upstream
//! errors, malformed callbacks) pass through from the protocol crate;
//! everything transport-shaped is converted at the strategy boundary so that
//! no platform fault escapes as a panic.

use idsbridge_protocol::ProtocolError;

use crate::platform::PlatformError;

/// Unified error type for the idsbridge flow layer.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A protocol-level failure: invalid configuration, upstream IdP error,
    /// state mismatch, or a malformed callback.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A platform primitive failed. Inside the native launch chain this
    /// triggers the next step; anywhere else it is final.
    #[error("transport failure in {operation}: {reason}")]
    Transport {
        /// The platform operation that failed.
        operation: String,
        /// What the platform reported.
        reason: String,
    },

    /// No callback arrived before the deadline. The listener is torn down.
    #[error("authentication timed out after {timeout_secs} seconds")]
    Timeout {
        /// How many seconds we waited before giving up.
        timeout_secs: u64,
    },

    /// The user cancelled the browser auth session. Distinct from other
    /// failures so callers can skip error UI.
    #[error("user cancelled authentication")]
    Cancelled,

    /// The deep-link event source shut down while a flow was waiting on it.
    #[error("deep link listener closed")]
    ListenerClosed,

    /// An HTTP request to the exchange endpoint failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PlatformError> for FlowError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Unsupported { operation } => Self::Transport {
                operation,
                reason: "not supported on this platform".to_string(),
            },
            PlatformError::Failed { operation, reason } => Self::Transport { operation, reason },
        }
    }
}

impl From<url::ParseError> for FlowError {
    fn from(err: url::ParseError) -> Self {
        Self::Protocol(ProtocolError::UrlParse(err))
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, FlowError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
