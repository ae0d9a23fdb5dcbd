//! Flow orchestration.
//!
//! [`Authenticator`] is the crate's front door. It owns the configuration,
//! the scheme table, and the platform handle, and routes each attempt to
//! one of three paths:
//!
//! - companion app installed and the platform can launch apps: the
//!   native-app strategy, requesting the `mobile-app` ACR;
//! - companion app installed but app launching is out of reach (embedded
//!   hosts): the attempt is handed back as a WebView grant for the caller
//!   to drive;
//! - no companion app: the browser strategy, requesting the `low` ACR.
//!
//! Every attempt gets fresh security parameters and its own session, so
//! concurrent calls never share state and their callbacks cannot cross.

use std::sync::Arc;

use idsbridge_protocol::authorize::{build_authorize_url, AcrValue};
use idsbridge_protocol::config::AuthConfig;
use idsbridge_protocol::outcome::{AuthGrant, AuthSession, FlowPath, WebViewAuthParams};
use idsbridge_protocol::schemes::AppSchemeTable;
use idsbridge_protocol::security::{new_code_verifier, new_state};

use crate::detect::app_installed;
use crate::error::Result;
use crate::platform::Platform;
use crate::strategy::{BrowserLaunch, NativeAppLaunch};
use crate::webview::WebViewAuthSession;

/// Entry point for IDS Hub authentication flows.
///
/// Cheap to clone-by-hand via `Arc` if the host needs to share it; every
/// public method takes `&self` and attempts are independent.
pub struct Authenticator {
    config: AuthConfig,
    schemes: AppSchemeTable,
    platform: Arc<dyn Platform>,
}

impl Authenticator {
    /// Create an authenticator with the default scheme table.
    ///
    /// Validates the configuration up front so a bad deployment fails at
    /// startup instead of mid-flow.
    pub fn new(config: AuthConfig, platform: Arc<dyn Platform>) -> Result<Self> {
        Self::with_schemes(config, AppSchemeTable::default(), platform)
    }

    /// Create an authenticator with a custom scheme table.
    pub fn with_schemes(
        config: AuthConfig,
        schemes: AppSchemeTable,
        platform: Arc<dyn Platform>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            schemes,
            platform,
        })
    }

    /// The validated configuration this authenticator runs with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Whether the IDS Hub companion app is present on this device.
    ///
    /// Fail-safe: platform probe errors report as not installed.
    pub async fn is_app_installed(&self) -> bool {
        app_installed(
            self.platform.as_ref(),
            &self.schemes,
            self.config.environment,
        )
        .await
    }

    /// Run one authentication attempt to completion.
    ///
    /// Resolves exactly once: with a code grant, a deferred WebView grant,
    /// or an error. Cancelling the future abandons the attempt cleanly; the
    /// listener subscription is dropped with it.
    pub async fn authenticate(&self) -> Result<AuthGrant> {
        // 1. Route on app presence.
        let installed = self.is_app_installed().await;
        tracing::info!(
            environment = %self.config.environment,
            app_installed = installed,
            "starting authentication"
        );

        if installed {
            // 2a. App present but this host cannot launch apps (embedded
            //     contexts): hand the attempt back for a WebView hop.
            if !self.platform.supports_app_launch() {
                let session = self.begin_session(AcrValue::MobileApp, FlowPath::WebView)?;
                tracing::info!(session = %session.id, path = %session.path, "deferring to embedder web view");
                return Ok(AuthGrant::WebView(
                    session.web_view_params(&self.config.redirect_uri, true),
                ));
            }

            // 2b. App present and launchable: native path, app-grade ACR.
            let session = self.begin_session(AcrValue::MobileApp, FlowPath::NativeApp)?;
            tracing::info!(session = %session.id, path = %session.path, "routing to companion app");
            return NativeAppLaunch::new(self.platform.as_ref(), &self.schemes, &self.config)
                .run(&session)
                .await;
        }

        // 3. No app: browser path, baseline ACR.
        let session = self.begin_session(AcrValue::Low, FlowPath::Browser)?;
        tracing::info!(session = %session.id, path = %session.path, "routing to browser");
        BrowserLaunch::new(self.platform.as_ref(), &self.config)
            .run(&session)
            .await
    }

    /// Build the parameter block for an embedder-driven WebView attempt
    /// without launching anything.
    ///
    /// The ACR follows detection the same way [`authenticate`] routes, and
    /// `use_web_view` reports what detection found so the embedder can pick
    /// its own presentation.
    ///
    /// [`authenticate`]: Self::authenticate
    pub async fn prepare_auth(&self) -> Result<WebViewAuthParams> {
        let installed = self.is_app_installed().await;
        let acr = if installed {
            AcrValue::MobileApp
        } else {
            AcrValue::Low
        };
        let session = self.begin_session(acr, FlowPath::WebView)?;
        tracing::info!(session = %session.id, app_installed = installed, "prepared web view attempt");
        Ok(session.web_view_params(&self.config.redirect_uri, installed))
    }

    /// Wrap prepared parameters in a WebView bridge bound to this
    /// authenticator's configuration and platform.
    pub fn web_view_session(&self, params: WebViewAuthParams) -> Result<WebViewAuthSession> {
        WebViewAuthSession::new(
            params,
            &self.config,
            self.schemes.clone(),
            Arc::clone(&self.platform),
        )
    }

    /// Fresh security parameters and a session for one attempt.
    fn begin_session(&self, acr: AcrValue, path: FlowPath) -> Result<AuthSession> {
        let state = new_state()?;
        let code_verifier = new_code_verifier()?;
        let auth_url = build_authorize_url(&self.config, acr, &state)?;
        Ok(AuthSession::begin(state, code_verifier, acr, auth_url, path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
