//! Session authentication and the OAuth handoff token.
//!
//! This module provides:
//! - `AuthSession` - extractor resolving the session cookie to a user
//! - handoff token signing/verification for the OAuth redirect chain
//! - session cookie construction helpers

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use stylelayer_core::SessionUser;

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "stylelayer_session";

/// Tokens shorter than this are rejected before touching the store.
const MIN_TOKEN_LEN: usize = 16;

/// How long a handoff token stays valid, in seconds.
const HANDOFF_TTL_SECONDS: i64 = 60;

/// An authenticated session extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The opaque session token (needed for sign-out).
    pub session_id: String,
    /// The user this session belongs to.
    pub user: SessionUser,
}

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = session_token_from_parts(parts).ok_or(ApiError::Unauthorized)?;

            let user = state
                .store
                .get_session(&token)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?
                .ok_or(ApiError::Unauthorized)?;

            Ok(AuthSession {
                session_id: token,
                user,
            })
        })
    }
}

/// Pull the session token out of the Cookie header, with a cheap length
/// check so garbage values never hit the database.
fn session_token_from_parts(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get("cookie")?.to_str().ok()?;

    let token = cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })?;

    if token.len() < MIN_TOKEN_LEN {
        return None;
    }
    Some(token)
}

// ============================================================================
// Handoff token
// ============================================================================

/// Claims carried by the handoff token: who signed in and which session
/// was minted for them.
///
/// The OAuth callback cannot reliably set a cookie inside the provider's
/// redirect chain, so it hands the freshly minted session token to
/// `/auth/complete` in a short-lived signed token instead.
#[derive(Debug, Serialize, Deserialize)]
struct HandoffClaims {
    /// The identity the session belongs to.
    sub: String,
    /// The session token to place in the cookie.
    sid: String,
    /// Unix expiry timestamp.
    exp: i64,
}

/// A verified handoff: the identity and session token the claims assert.
#[derive(Debug)]
pub struct VerifiedHandoff {
    /// The identity the session belongs to.
    pub identity_id: String,
    /// The session token to place in the cookie.
    pub session_id: String,
}

/// Sign a handoff token binding a session token to its identity.
///
/// Format: `hex(json claims) + "." + hmac_sha256_hex(secret, payload)`.
#[must_use]
pub fn sign_handoff(identity_id: &str, session_token: &str, secret: &str) -> String {
    let claims = HandoffClaims {
        sub: identity_id.to_string(),
        sid: session_token.to_string(),
        exp: Utc::now().timestamp() + HANDOFF_TTL_SECONDS,
    };
    // Serializing a struct of Strings and an i64 cannot fail.
    let json = serde_json::to_string(&claims).unwrap_or_default();
    let payload = hex::encode(json);
    let signature = hmac_sha256_hex(secret, &payload);

    format!("{payload}.{signature}")
}

/// Verify a handoff token; returns its claims when the signature checks
/// out and the token has not expired.
#[must_use]
pub fn verify_handoff(token: &str, secret: &str) -> Option<VerifiedHandoff> {
    let (payload, signature) = token.split_once('.')?;

    let expected = hmac_sha256_hex(secret, payload);
    if !constant_time_eq(signature, &expected) {
        return None;
    }

    let json = hex::decode(payload).ok()?;
    let claims: HandoffClaims = serde_json::from_slice(&json).ok()?;

    if claims.exp < Utc::now().timestamp() {
        return None;
    }
    Some(VerifiedHandoff {
        identity_id: claims.sub,
        session_id: claims.sid,
    })
}

// ============================================================================
// Cookie helpers
// ============================================================================

/// Build the Set-Cookie value establishing a session.
///
/// HttpOnly and SameSite=Lax always; Secure when the service is reached
/// over HTTPS.
#[must_use]
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value clearing the session.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_round_trip() {
        let token = sign_handoff("g-1", "abc123def456abc1", "secret");
        let verified = verify_handoff(&token, "secret").unwrap();
        assert_eq!(verified.identity_id, "g-1");
        assert_eq!(verified.session_id, "abc123def456abc1");
    }

    #[test]
    fn handoff_rejects_wrong_secret() {
        let token = sign_handoff("g-1", "abc123def456abc1", "secret");
        assert!(verify_handoff(&token, "other").is_none());
    }

    #[test]
    fn handoff_rejects_tampered_payload() {
        let token = sign_handoff("g-1", "abc123def456abc1", "secret");
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!(
            "{}.{signature}",
            hex::encode("{\"sub\":\"g-2\",\"sid\":\"x\",\"exp\":99999999999}")
        );
        assert!(verify_handoff(&forged, "secret").is_none());
    }

    #[test]
    fn handoff_rejects_garbage() {
        assert!(verify_handoff("not-a-token", "secret").is_none());
        assert!(verify_handoff("", "secret").is_none());
        assert!(verify_handoff("a.b", "secret").is_none());
    }

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("tok", 3600, true);
        assert!(cookie.starts_with("stylelayer_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));

        let cookie = session_cookie("tok", 3600, false);
        assert!(!cookie.contains("Secure"));
    }
}
