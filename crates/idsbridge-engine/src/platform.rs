//! Platform capability seam.
//!
//! The flow layer consumes a handful of OS primitives: package introspection,
//! URL opening, the system browser auth session, and the inbound deep-link
//! stream. [`Platform`] is the single seam behind which the iOS, Android, and
//! test implementations live. Primitives a platform does not have report
//! [`PlatformError::Unsupported`]; the flow layer falls back rather than
//! failing on those.
//!
//! The Android-flavored launch primitives ship default implementations that
//! report `Unsupported`, so iOS-shaped platforms only implement what exists
//! there.

use async_trait::async_trait;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// How a system browser auth session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserSessionOutcome {
    /// The session completed; `url` is the callback it captured, when the
    /// platform hands one back directly.
    Success {
        /// The callback URL, if the session captured one.
        url: Option<String>,
    },
    /// The user dismissed the session through its cancel affordance.
    Cancelled,
    /// The session went away without producing a URL (swiped away, covered
    /// by an app switch). The callback may still arrive as a deep link.
    Dismissed,
    /// The platform reported an outcome this crate does not recognize.
    Unknown,
}

/// Error surfaced by platform primitives.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The primitive does not exist on this platform or OS version.
    #[error("{operation} is not supported on this platform")]
    Unsupported {
        /// The primitive that is missing.
        operation: String,
    },

    /// The primitive exists but failed.
    #[error("{operation} failed: {reason}")]
    Failed {
        /// The primitive that failed.
        operation: String,
        /// What the platform reported.
        reason: String,
    },
}

impl PlatformError {
    /// Shorthand for an [`PlatformError::Unsupported`] report.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Shorthand for a [`PlatformError::Failed`] report.
    pub fn failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means "primitive not available" rather than
    /// "primitive broke".
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Convenience alias for platform primitive results.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// The OS primitives the flow layer is built on.
///
/// Implementations wrap the host platform's native APIs; the in-memory test
/// implementation drives flows deterministically. All methods take `&self`:
/// implementations are shared behind an `Arc` across concurrent attempts.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Whether the package with the given identifier is installed.
    ///
    /// Platforms without package introspection return
    /// [`PlatformError::Unsupported`]; the detector then falls back to the
    /// scheme probe.
    async fn is_app_installed(&self, package: &str) -> PlatformResult<bool>;

    /// Whether a handler is registered for the given URL.
    async fn can_open_url(&self, url: &str) -> PlatformResult<bool>;

    /// Hand a URL to the OS opener.
    async fn open_url(&self, url: &str) -> PlatformResult<()>;

    /// Open a system browser auth session at `url`, returning control when
    /// the session ends. `return_scheme` is the host scheme the session
    /// watches for.
    async fn open_auth_session(
        &self,
        url: &str,
        return_scheme: &str,
    ) -> PlatformResult<BrowserSessionOutcome>;

    /// Subscribe to inbound deep links. Links delivered before this call are
    /// not replayed, which is why flows subscribe before they launch
    /// anything.
    fn deep_links(&self) -> broadcast::Receiver<String>;

    /// The deep link that cold-started the app, if any.
    async fn initial_url(&self) -> PlatformResult<Option<String>> {
        Ok(None)
    }

    /// Launch an app by explicit intent, handing it `url` (Android).
    async fn open_app_with_intent(&self, package: &str, url: &str) -> PlatformResult<()> {
        let _ = (package, url);
        Err(PlatformError::unsupported("open_app_with_intent"))
    }

    /// Launch an app directly, handing it `url` (Android).
    async fn launch_app(&self, package: &str, url: &str) -> PlatformResult<()> {
        let _ = (package, url);
        Err(PlatformError::unsupported("launch_app"))
    }

    /// Whether this platform can launch the companion app natively at all.
    /// Platforms that return `false` route detected-app attempts to the
    /// embedded WebView path instead.
    fn supports_app_launch(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
