//! Flow orchestration for IDS Hub authentication on mobile hosts.
//!
//! This crate drives a whole authentication attempt end to end on top of
//! [`idsbridge_protocol`]: detect whether the IDS Hub companion app is on
//! the device, build the authorization request, launch the right transport,
//! wait for the callback, and resolve to exactly one grant or error.
//!
//! - [`orchestrator::Authenticator`] — the front door: `authenticate()`,
//!   `prepare_auth()`, `is_app_installed()`.
//! - [`platform::Platform`] — the primitives the host app must provide
//!   (probes, openers, browser session, deep-link stream).
//! - [`events::DeepLinkBus`] — fan-out the host's OS glue publishes inbound
//!   deep links into.
//! - [`webview::WebViewAuthSession`] — interception bridge for hosts that
//!   render the hop in an embedded web surface.
//! - [`relay::CodeRelay`] — forwards the resulting code and verifier to the
//!   app backend that completes the exchange.
//! - [`detect`] — fail-safe companion-app presence probe.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use idsbridge_engine::{Authenticator, CodeRelay, Platform};
//! use idsbridge_protocol::config::{AuthConfig, Environment};
//! use idsbridge_protocol::outcome::AuthGrant;
//!
//! async fn sign_in(platform: Arc<dyn Platform>) -> Result<(), idsbridge_engine::FlowError> {
//!     let config = AuthConfig::new(
//!         Environment::Production,
//!         "sp-mobile",
//!         "no.example.app://auth/idshub/callback",
//!         "https://idp.idshub.example/authorize",
//!         "https://api.example.org/oauth/token",
//!     );
//!     let auth = Authenticator::new(config, platform)?;
//!
//!     match auth.authenticate().await? {
//!         AuthGrant::Code {
//!             code, code_verifier, ..
//!         } => {
//!             let relay = CodeRelay::new(auth.config());
//!             let _tokens = relay.relay_code(&code, &code_verifier).await?;
//!         }
//!         AuthGrant::WebView(params) => {
//!             // Hand the parameters to the UI layer and drive a
//!             // WebViewAuthSession from there.
//!             let _ = params;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod detect;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod platform;
pub mod relay;
pub mod webview;

mod listener;
mod strategy;

#[cfg(test)]
mod testutil;

pub use error::{FlowError, Result};
pub use events::DeepLinkBus;
pub use orchestrator::Authenticator;
pub use platform::{BrowserSessionOutcome, Platform, PlatformError, PlatformResult};
pub use relay::CodeRelay;
pub use webview::{DeepLinkDecision, NavigationDecision, WebViewAuthSession, WebViewOutcome};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
