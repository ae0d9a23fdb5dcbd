//! Configurable platform double shared by the engine's unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use idsbridge_protocol::authorize::{build_authorize_url, AcrValue, PARAM_SP_URL};
use idsbridge_protocol::callback::{canonicalize_url, query_param};
use idsbridge_protocol::config::{AuthConfig, Environment};
use idsbridge_protocol::outcome::{AuthSession, FlowPath};
use idsbridge_protocol::security::{new_code_verifier, new_state};

use crate::events::DeepLinkBus;
use crate::platform::{BrowserSessionOutcome, Platform, PlatformError, PlatformResult};

/// How one fake launch step behaves when invoked.
#[derive(Clone, Copy)]
pub(crate) enum StepBehavior {
    Works,
    Unsupported,
    Fails,
}

/// What the fake does after a launch step succeeds.
#[derive(Clone)]
pub(crate) enum LaunchResponse {
    /// Nothing comes back; the attempt is left waiting.
    Nothing,
    /// This exact link is published before the launch call returns.
    Publish(String),
    /// A success callback derived from the opened URL is published before
    /// the launch call returns, like an instant round trip through the IdP.
    Echo,
}

/// Derive the success callback a completed IdP round trip would deliver.
///
/// Accepts either a composed app deep link (the authorize URL rides in
/// `spUrl`) or a bare authorize URL, reads `state` and `redirect_uri` out of
/// it, and produces `<redirect>?code=echo-<state>&state=<state>`.
pub(crate) fn echo_callback(opened_url: &str) -> Option<String> {
    let parsed = url::Url::parse(&canonicalize_url(opened_url)).ok()?;
    let auth_url = match query_param(&parsed, PARAM_SP_URL) {
        Some(inner) => url::Url::parse(&canonicalize_url(&inner)).ok()?,
        None => parsed,
    };
    let state = query_param(&auth_url, "state")?;
    let redirect = query_param(&auth_url, "redirect_uri")?;
    Some(format!("{redirect}?code=echo-{state}&state={state}"))
}

/// A config pointing at nothing real, for composing URLs in tests.
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig::new(
        Environment::Production,
        "sp-mobile",
        "no.example.app://auth/idshub/callback",
        "https://idp.idshub.example/authorize",
        "https://api.example.org/oauth/token",
    )
}

/// A session built the same way the orchestrator builds one.
pub(crate) fn test_session(config: &AuthConfig, acr: AcrValue, path: FlowPath) -> AuthSession {
    let state = new_state().unwrap();
    let code_verifier = new_code_verifier().unwrap();
    let auth_url = build_authorize_url(config, acr, &state).unwrap();
    AuthSession::begin(state, code_verifier, acr, auth_url, path)
}

/// A [`Platform`] whose every answer is a knob.
///
/// Construct with [`FakePlatform::new`] (everything succeeds, launches echo
/// a success callback) and overwrite fields per test. Calls are recorded as
/// `"operation:argument"` strings for order assertions.
pub(crate) struct FakePlatform {
    pub(crate) bus: DeepLinkBus,
    pub(crate) installed: bool,
    pub(crate) supports_launch: bool,
    pub(crate) intent_step: StepBehavior,
    pub(crate) launch_step: StepBehavior,
    pub(crate) open_step: StepBehavior,
    pub(crate) openable: bool,
    pub(crate) on_launch: LaunchResponse,
    pub(crate) session_step: StepBehavior,
    pub(crate) session_outcome: BrowserSessionOutcome,
    pub(crate) session_response: LaunchResponse,
    pub(crate) initial: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self {
            bus: DeepLinkBus::new(16),
            installed: true,
            supports_launch: true,
            intent_step: StepBehavior::Works,
            launch_step: StepBehavior::Works,
            open_step: StepBehavior::Works,
            openable: true,
            on_launch: LaunchResponse::Echo,
            session_step: StepBehavior::Works,
            session_outcome: BrowserSessionOutcome::Unknown,
            session_response: LaunchResponse::Nothing,
            initial: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn step(&self, behavior: StepBehavior, operation: &str) -> PlatformResult<()> {
        match behavior {
            StepBehavior::Works => Ok(()),
            StepBehavior::Unsupported => Err(PlatformError::unsupported(operation)),
            StepBehavior::Fails => Err(PlatformError::failed(operation, "injected failure")),
        }
    }

    fn respond(&self, response: &LaunchResponse, opened_url: &str) {
        match response {
            LaunchResponse::Nothing => {}
            LaunchResponse::Publish(link) => {
                self.bus.publish(link.clone());
            }
            LaunchResponse::Echo => {
                if let Some(link) = echo_callback(opened_url) {
                    self.bus.publish(link);
                }
            }
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn is_app_installed(&self, package: &str) -> PlatformResult<bool> {
        self.record(format!("is_app_installed:{package}"));
        Ok(self.installed)
    }

    async fn can_open_url(&self, url: &str) -> PlatformResult<bool> {
        self.record(format!("can_open_url:{url}"));
        Ok(self.openable)
    }

    async fn open_url(&self, url: &str) -> PlatformResult<()> {
        self.record(format!("open_url:{url}"));
        self.step(self.open_step, "open_url")?;
        self.respond(&self.on_launch, url);
        Ok(())
    }

    async fn open_auth_session(
        &self,
        url: &str,
        return_scheme: &str,
    ) -> PlatformResult<BrowserSessionOutcome> {
        self.record(format!("open_auth_session:{return_scheme}:{url}"));
        self.step(self.session_step, "open_auth_session")?;
        self.respond(&self.session_response, url);
        Ok(self.session_outcome.clone())
    }

    fn deep_links(&self) -> broadcast::Receiver<String> {
        self.bus.subscribe()
    }

    async fn initial_url(&self) -> PlatformResult<Option<String>> {
        Ok(self.initial.clone())
    }

    async fn open_app_with_intent(&self, package: &str, url: &str) -> PlatformResult<()> {
        self.record(format!("open_app_with_intent:{package}:{url}"));
        self.step(self.intent_step, "open_app_with_intent")?;
        self.respond(&self.on_launch, url);
        Ok(())
    }

    async fn launch_app(&self, package: &str, url: &str) -> PlatformResult<()> {
        self.record(format!("launch_app:{package}:{url}"));
        self.step(self.launch_step, "launch_app")?;
        self.respond(&self.on_launch, url);
        Ok(())
    }

    fn supports_app_launch(&self) -> bool {
        self.supports_launch
    }
}
