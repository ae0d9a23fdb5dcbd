//! Security parameter generation.
//!
//! Every authentication attempt is protected by two random values: a `state`
//! token that ties callbacks to the attempt that issued them (CSRF
//! protection), and a PKCE code verifier (RFC 7636) that the backend presents
//! when it exchanges the authorization code. Both are produced here from the
//! system CSPRNG and base64url-encoded without padding.
//!
//! Using [`ring::rand::SystemRandom`] is a correctness requirement, not a
//! style choice: these values must be unguessable.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{ProtocolError, Result};

/// Length of the state token in bytes (before base64 encoding).
const STATE_BYTES: usize = 16;

/// Length of the PKCE code verifier in bytes (before base64 encoding).
///
/// 32 bytes encode to 43 characters, the minimum length RFC 7636 permits.
const VERIFIER_BYTES: usize = 32;

/// Generate a random `state` token for CSRF protection.
///
/// # Errors
///
/// Returns [`ProtocolError::Rng`] if the system CSPRNG fails.
pub fn new_state() -> Result<String> {
    random_urlsafe(STATE_BYTES)
}

/// Generate a PKCE code verifier (RFC 7636).
///
/// The result is 43 characters drawn from the unreserved set
/// (`A-Z a-z 0-9 - _`), satisfying the 43..=128 length bound.
///
/// # Errors
///
/// Returns [`ProtocolError::Rng`] if the system CSPRNG fails.
pub fn new_code_verifier() -> Result<String> {
    random_urlsafe(VERIFIER_BYTES)
}

/// Fill `len` bytes from the system CSPRNG and base64url-encode them.
fn random_urlsafe(len: usize) -> Result<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes).map_err(|_| ProtocolError::Rng)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
