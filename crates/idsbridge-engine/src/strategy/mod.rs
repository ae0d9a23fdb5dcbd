//! Launch strategies.
//!
//! Once a session is routed, one strategy owns the attempt end to end:
//! hand the authorization URL to something that can show a login, wait for
//! the callback, validate it, and produce the grant. Two strategies exist,
//! one per transport:
//!
//! - [`NativeAppLaunch`]: compose an app deep link and walk the platform's
//!   launch mechanisms until one takes; if none do, degrade to the browser.
//! - [`BrowserLaunch`]: open a system browser auth session and race its
//!   outcome against the deep-link listener.
//!
//! Both follow the same discipline: the callback listener is armed *before*
//! anything is launched, so a callback that beats the launch call's return
//! is buffered rather than lost.

mod browser;
mod native_app;

pub(crate) use browser::BrowserLaunch;
pub(crate) use native_app::NativeAppLaunch;
