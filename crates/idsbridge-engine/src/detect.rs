//! Companion-app presence detection.
//!
//! Routing between the native-app path and the browser path starts with one
//! question: is the IDS Hub app installed on this device? Platforms answer
//! it differently. Android can query the package manager directly; iOS can
//! only ask whether the app's custom scheme is openable, and even that is
//! gated on an allow-list in the host app's Info.plist.
//!
//! Detection is fail-safe: any platform error, including "this probe is not
//! supported here", is reported as *not installed*. A wrong "not installed"
//! answer degrades the flow to the browser, which always works. A wrong
//! "installed" answer would send the user into a launch chain that dead-ends.

use idsbridge_protocol::config::Environment;
use idsbridge_protocol::schemes::AppSchemeTable;

use crate::platform::Platform;

/// Check whether the IDS Hub companion app for `env` is present.
///
/// Tries the package probe first and falls back to a scheme-openability
/// probe when the platform does not support package queries. Every error
/// path returns `false`.
pub async fn app_installed(
    platform: &dyn Platform,
    schemes: &AppSchemeTable,
    env: Environment,
) -> bool {
    let app = schemes.for_env(env);

    match platform.is_app_installed(&app.package).await {
        Ok(installed) => {
            tracing::debug!(package = %app.package, installed, "package probe");
            return installed;
        }
        Err(err) if err.is_unsupported() => {
            tracing::debug!(package = %app.package, "package probe unsupported, trying scheme");
        }
        Err(err) => {
            tracing::debug!(package = %app.package, error = %err, "package probe failed");
            return false;
        }
    }

    let probe = schemes.probe_url(env);
    match platform.can_open_url(&probe).await {
        Ok(openable) => {
            tracing::debug!(url = %probe, openable, "scheme probe");
            openable
        }
        Err(err) => {
            tracing::debug!(url = %probe, error = %err, "scheme probe failed");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
