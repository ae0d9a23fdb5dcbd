//! Native-app launch strategy.
//!
//! Hands the attempt to the IDS Hub companion app through a composed deep
//! link. Platforms expose up to three launch mechanisms of decreasing
//! specificity, and any of them can be missing or broken on a given device,
//! so the strategy walks them in order and treats every error as "try the
//! next one". When the whole chain comes up empty the attempt degrades to
//! the browser strategy rather than failing: detection said the app was
//! there, but a launch that does not take must never strand the user.

use std::time::Duration;

use idsbridge_protocol::authorize::{build_app_deep_link, failure_redirect};
use idsbridge_protocol::callback::parse_callback;
use idsbridge_protocol::config::AuthConfig;
use idsbridge_protocol::outcome::{AuthGrant, AuthSession};
use idsbridge_protocol::schemes::AppSchemeTable;

use crate::error::Result;
use crate::listener::{CallbackListener, CALLBACK_TIMEOUT_SECS};
use crate::platform::Platform;
use crate::strategy::BrowserLaunch;

/// One attempt's hand-off to the companion app.
pub(crate) struct NativeAppLaunch<'a> {
    platform: &'a dyn Platform,
    schemes: &'a AppSchemeTable,
    config: &'a AuthConfig,
}

impl<'a> NativeAppLaunch<'a> {
    pub(crate) fn new(
        platform: &'a dyn Platform,
        schemes: &'a AppSchemeTable,
        config: &'a AuthConfig,
    ) -> Self {
        Self {
            platform,
            schemes,
            config,
        }
    }

    /// Run the attempt to completion.
    pub(crate) async fn run(&self, session: &AuthSession) -> Result<AuthGrant> {
        let app = self.schemes.for_env(self.config.environment);

        // 1. Compose the deep link the app will unpack: the authorize URL
        //    rides in spUrl, flanked by where to bounce on success and on
        //    decline.
        let failure_url = failure_redirect(&self.config.redirect_uri)?;
        let deep_link = build_app_deep_link(
            &app.scheme,
            &session.auth_url,
            &self.config.redirect_uri,
            &failure_url,
        )?;

        // 2. Arm the listener before anything launches. The app can bounce
        //    back before a launch call returns; an unarmed bus drops that.
        let listener = CallbackListener::arm(
            self.platform.deep_links(),
            &self.config.redirect_uri,
            &session.state,
        );

        // 3. Walk the launch chain. An exhausted chain means detection was
        //    wrong or the app is wedged; degrade to the browser with the
        //    same session rather than surfacing an error.
        if !self.try_launch(&app.package, &deep_link).await {
            tracing::warn!(
                session = %session.id,
                package = %app.package,
                "app launch chain exhausted, falling back to browser"
            );
            drop(listener);
            return BrowserLaunch::new(self.platform, self.config).run(session).await;
        }
        tracing::info!(session = %session.id, package = %app.package, "companion app launched");

        // 4. Wait for the callback and validate it against this session.
        let initial = match self.platform.initial_url().await {
            Ok(link) => link,
            Err(err) => {
                tracing::debug!(error = %err, "initial link probe failed");
                None
            }
        };
        let callback_url = listener
            .wait(initial, Duration::from_secs(CALLBACK_TIMEOUT_SECS))
            .await?;
        let code = parse_callback(&callback_url, &session.state)?;
        Ok(session.grant_for(code))
    }

    /// Try each launch mechanism until one takes.
    async fn try_launch(&self, package: &str, deep_link: &str) -> bool {
        // 1. Explicit app intent, the most direct mechanism where it exists.
        match self.platform.open_app_with_intent(package, deep_link).await {
            Ok(()) => return true,
            Err(err) => tracing::debug!(error = %err, "intent launch did not take"),
        }

        // 2. Direct package launch.
        match self.platform.launch_app(package, deep_link).await {
            Ok(()) => return true,
            Err(err) => tracing::debug!(error = %err, "package launch did not take"),
        }

        // 3. Plain URL open, gated on an openability probe.
        match self.platform.can_open_url(deep_link).await {
            Ok(true) => match self.platform.open_url(deep_link).await {
                Ok(()) => return true,
                Err(err) => tracing::debug!(error = %err, "url open did not take"),
            },
            Ok(false) => tracing::debug!("deep link reported unopenable"),
            Err(err) => tracing::debug!(error = %err, "openability probe failed"),
        }

        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use idsbridge_protocol::authorize::AcrValue;
    use idsbridge_protocol::error::ProtocolError;
    use idsbridge_protocol::outcome::FlowPath;

    use super::*;
    use crate::error::FlowError;
    use crate::testutil::{test_config, test_session, FakePlatform, LaunchResponse, StepBehavior};

    fn assert_code_grant(grant: AuthGrant, session: &AuthSession) {
        match grant {
            AuthGrant::Code {
                code,
                state,
                code_verifier,
            } => {
                assert_eq!(code, format!("echo-{}", session.state));
                assert_eq!(state, session.state);
                assert_eq!(code_verifier, session.code_verifier);
            }
            other => panic!("unexpected grant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn intent_launch_resolves_with_echoed_code() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let platform = FakePlatform::new();
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        let grant = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("attempt should resolve");

        assert_code_grant(grant, &session);
        let calls = platform.calls();
        assert!(calls[0].starts_with("open_app_with_intent:org.idshub.app"));
        assert!(!calls.iter().any(|c| c.starts_with("launch_app")));
    }

    #[tokio::test]
    async fn callback_published_during_launch_is_not_lost() {
        // Echo publishes inside the launch call itself. There is no replay
        // on subscribe, so this only resolves if the listener was armed
        // before the launch.
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let platform = FakePlatform::new();
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("buffered callback should resolve the attempt");
    }

    #[tokio::test]
    async fn unsupported_intent_falls_through_to_package_launch() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        platform.intent_step = StepBehavior::Unsupported;
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        let grant = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("attempt should resolve");

        assert_code_grant(grant, &session);
        let calls = platform.calls();
        assert!(calls[0].starts_with("open_app_with_intent"));
        assert!(calls[1].starts_with("launch_app:org.idshub.app"));
    }

    #[tokio::test]
    async fn hard_step_failure_also_falls_through() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        platform.intent_step = StepBehavior::Fails;
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("attempt should resolve via the next step");

        assert!(platform.calls()[1].starts_with("launch_app"));
    }

    #[tokio::test]
    async fn chain_reaches_plain_url_open() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        platform.intent_step = StepBehavior::Unsupported;
        platform.launch_step = StepBehavior::Unsupported;
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        let grant = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("attempt should resolve");

        assert_code_grant(grant, &session);
        let calls = platform.calls();
        assert!(calls.iter().any(|c| c.starts_with("can_open_url:idshub://idshub/authorize")));
        assert!(calls.iter().any(|c| c.starts_with("open_url:idshub://idshub/authorize")));
    }

    #[tokio::test]
    async fn exhausted_chain_degrades_to_browser() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        platform.intent_step = StepBehavior::Unsupported;
        platform.launch_step = StepBehavior::Unsupported;
        platform.openable = false;
        platform.session_response = LaunchResponse::Echo;
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        let grant = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect("browser fallback should resolve");

        assert_code_grant(grant, &session);
        let calls = platform.calls();
        assert!(calls.last().unwrap().starts_with("open_auth_session:"));
        assert!(!calls.iter().any(|c| c.starts_with("open_url:")));
    }

    #[tokio::test]
    async fn declined_callback_surfaces_the_upstream_error() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);
        platform.on_launch = LaunchResponse::Publish(format!(
            "{}?error=access_denied&error_description=declined&state={}",
            config.redirect_uri, session.state
        ));

        let err = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect_err("declined callback should error");

        match err {
            FlowError::Protocol(ProtocolError::Upstream { code, .. }) => {
                assert_eq!(code, "access_denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_app_times_out_and_releases_the_listener() {
        let config = test_config();
        let schemes = AppSchemeTable::default();
        let mut platform = FakePlatform::new();
        platform.on_launch = LaunchResponse::Nothing;
        let session = test_session(&config, AcrValue::MobileApp, FlowPath::NativeApp);

        let err = NativeAppLaunch::new(&platform, &schemes, &config)
            .run(&session)
            .await
            .expect_err("silent app should time out");

        assert!(matches!(err, FlowError::Timeout { timeout_secs: 300 }));
        assert_eq!(platform.bus.subscriber_count(), 0);
    }
}
