//! Google OAuth sign-in, session and sign-out handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use stylelayer_core::{IdentityId, SessionUser};

use crate::auth::{
    clear_session_cookie, session_cookie, sign_handoff, verify_handoff, AuthSession,
};
use crate::crypto::generate_session_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters Google sends to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code on success.
    pub code: Option<String>,
    /// Error code when the user denied consent.
    pub error: Option<String>,
}

/// Query parameters for the handoff completion step.
#[derive(Debug, Deserialize)]
pub struct HandoffQuery {
    /// The signed handoff token.
    pub token: Option<String>,
}

/// Current session response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The signed-in user.
    pub user: SessionUser,
}

/// Sign-out response.
#[derive(Debug, Serialize)]
pub struct SignoutResponse {
    /// Whether the session was revoked.
    pub success: bool,
}

/// `GET /api/auth/google` - redirect the browser to Google's consent screen.
pub async fn google_signin(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Google sign-in is not configured".into()))?;

    let redirect_uri = callback_url(&state);
    let url = google
        .authorize_url(&redirect_uri)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Redirect::to(&url))
}

/// `GET /api/auth/callback` - exchange the authorization code, provision the
/// user, mint a session and bounce through `/auth/complete`.
///
/// Failures redirect back to the frontend with an `auth_error` query param;
/// this endpoint is only ever visited by a browser mid-redirect, so JSON
/// errors would strand the user.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = &query.error {
        tracing::warn!(error = %error, "OAuth consent denied");
        return frontend_error(&state, "access_denied");
    }
    let Some(code) = query.code else {
        return frontend_error(&state, "missing_code");
    };
    let Some(google) = state.google.as_ref() else {
        return frontend_error(&state, "not_configured");
    };

    let redirect_uri = callback_url(&state);

    let userinfo = match google.exchange_code(&code, &redirect_uri).await {
        Ok(tokens) => match google.fetch_userinfo(&tokens.access_token).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch Google userinfo");
                return frontend_error(&state, "oauth_failed");
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to exchange OAuth code");
            return frontend_error(&state, "oauth_failed");
        }
    };

    let Ok(identity_id) = userinfo.id.parse::<IdentityId>() else {
        tracing::warn!("Google userinfo returned an empty subject");
        return frontend_error(&state, "oauth_failed");
    };

    let user = SessionUser {
        identity_id: identity_id.clone(),
        email: userinfo.email.clone(),
        name: userinfo.name.unwrap_or_else(|| userinfo.email.clone()),
        picture: userinfo.picture,
    };

    if let Err(e) = state
        .store
        .get_or_create_user(&identity_id, &userinfo.email)
        .await
    {
        tracing::error!(error = %e, "Failed to provision user");
        return frontend_error(&state, "server_error");
    }

    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);
    if let Err(e) = state.store.create_session(&token, &user, expires_at).await {
        tracing::error!(error = %e, "Failed to create session");
        return frontend_error(&state, "server_error");
    }

    // The cookie is set by /auth/complete on a same-site navigation;
    // setting it here, inside the cross-site redirect from Google, is
    // dropped by some browsers.
    let handoff = sign_handoff(identity_id.as_str(), &token, &state.config.session_secret);
    Redirect::to(&format!("/auth/complete?token={handoff}"))
}

/// `GET /auth/complete` - verify the handoff token, set the session cookie
/// and send the user on to the frontend.
pub async fn auth_complete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HandoffQuery>,
) -> Response {
    let handoff = query
        .token
        .as_deref()
        .and_then(|t| verify_handoff(t, &state.config.session_secret));

    let Some(handoff) = handoff else {
        tracing::warn!("Invalid or expired handoff token");
        return frontend_error(&state, "invalid_token").into_response();
    };

    tracing::info!(identity_id = %handoff.identity_id, "Session handoff completed");

    let max_age = state.config.session_ttl_days * 24 * 60 * 60;
    let cookie = session_cookie(&handoff.session_id, max_age, state.is_https());

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to(&state.config.frontend_url),
    )
        .into_response()
}

/// `GET /api/auth/session` - the current user, or 401.
pub async fn get_session(session: AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse { user: session.user })
}

/// `POST /api/auth/signout` - revoke the session and clear the cookie.
pub async fn signout(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_session(&session.session_id).await?;

    tracing::info!(identity_id = %session.user.identity_id, "Session revoked");

    Ok((
        AppendHeaders([(SET_COOKIE, clear_session_cookie(state.is_https()))]),
        Json(SignoutResponse { success: true }),
    ))
}

fn callback_url(state: &AppState) -> String {
    format!("{}/api/auth/callback", state.config.public_url)
}

fn frontend_error(state: &AppState, code: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?auth_error={code}",
        state.config.frontend_url
    ))
}
