//! Protocol layer for IDS Hub authentication.
//!
//! This crate is the pure, I/O-free half of idsbridge. It knows the IDS Hub
//! wire contract and nothing about platforms, browsers, or WebViews:
//!
//! - **Configuration**: validated [`AuthConfig`] (TOML-loadable) and the
//!   per-environment [`AppSchemeTable`]
//! - **Security parameters**: CSPRNG-backed `state` and PKCE verifier
//! - **Authorization URLs**: the IdP authorize URL and the companion-app
//!   deep link that wraps it
//! - **Callback parsing**: one canonicalization point for the three callback
//!   URL dialects, case-insensitive parameters, strict decision order
//! - **Outcomes**: [`AuthGrant`], [`WebViewAuthParams`], per-attempt
//!   [`AuthSession`]
//!
//! The async flow layer lives in `idsbridge-engine` and is this crate's only
//! intended consumer, but everything here is usable standalone (for example
//! from backend code validating forwarded callbacks).
//!
//! # Quick Start
//!
//! ```rust
//! use idsbridge_protocol::{
//!     build_authorize_url, parse_callback, new_code_verifier, new_state,
//!     AcrValue, AuthConfig, Environment,
//! };
//!
//! # fn example() -> idsbridge_protocol::error::Result<()> {
//! let config = AuthConfig::new(
//!     Environment::Production,
//!     "sp-mobile",
//!     "no.example.app://auth/idshub/callback",
//!     "https://idp.idshub.example/authorize",
//!     "https://api.example.org/oauth/token",
//! );
//! config.validate()?;
//!
//! let state = new_state()?;
//! let verifier = new_code_verifier()?;
//! let auth_url = build_authorize_url(&config, AcrValue::Low, &state)?;
//!
//! // ... user authenticates, a callback URL comes back ...
//! # let callback = format!("no.example.app://auth/idshub/callback?code=c&state={state}");
//! let grant = parse_callback(&callback, &state)?;
//! assert!(!grant.code.is_empty());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod authorize;
pub mod callback;
pub mod config;
pub mod error;
pub mod outcome;
pub mod schemes;
pub mod security;

// Re-export key types at the crate root for convenience.
pub use authorize::{
    AcrValue, ERROR_ACCESS_DENIED, PARAM_FAILURE_URL, PARAM_SP_URL, PARAM_SUCCESS_URL,
    build_app_deep_link, build_authorize_url, failure_redirect,
};
pub use callback::{AuthCode, canonicalize_url, parse_callback, query_param, with_scheme};
pub use config::{AuthConfig, Environment};
pub use error::{ProtocolError, Result};
pub use outcome::{AuthGrant, AuthSession, FlowPath, WebViewAuthParams};
pub use schemes::{AppScheme, AppSchemeTable};
pub use security::{new_code_verifier, new_state};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_available() {
        // Verify key types are re-exported at the crate root.
        let _ = AppSchemeTable::new();
        let _ = AcrValue::Low;
        let _ = Environment::Staging;
    }

    #[test]
    fn whole_protocol_round_trip() {
        // Build an authorize URL, wrap it in the app deep link, then parse a
        // callback built from the same state. This is the protocol-level
        // happy path end to end; transports are exercised in the engine.
        let config = AuthConfig::new(
            Environment::Staging,
            "sp-mobile",
            "no.example.app://auth/idshub/callback",
            "https://idp.test.idshub.example/authorize",
            "https://api.test.example.org/oauth/token",
        );
        config.validate().unwrap();

        let state = new_state().unwrap();
        let auth_url = build_authorize_url(&config, AcrValue::MobileApp, &state).unwrap();
        let failure = failure_redirect(&config.redirect_uri).unwrap();
        let link =
            build_app_deep_link("idshub-test", &auth_url, &config.redirect_uri, &failure).unwrap();
        assert!(link.starts_with("idshub-test://idshub/authorize?"));

        let callback = format!("{}?code=abc&state={state}", config.redirect_uri);
        let grant = parse_callback(&callback, &state).unwrap();
        assert_eq!(grant.code, "abc");

        // The failure callback parses as the upstream error it was tagged with.
        let err = parse_callback(&failure, &state).unwrap_err();
        assert!(matches!(err, ProtocolError::Upstream { .. }));
    }
}
