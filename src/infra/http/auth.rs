//! Bearer-token middleware.
//!
//! `require_auth` rejects requests without a valid token; `optional_auth`
//! always attaches a [`Viewer`], anonymous unless a token verifies.
//! Handlers read the caller with `Extension<Principal>` or `Extension<Viewer>`.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::application::auth::{AuthError, Principal};

use super::AppState;
use super::error::ApiError;

/// Caller on routes where authentication is optional.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Principal>);

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let principal = match authenticate(&state, request.headers().get(AUTHORIZATION)) {
        Ok(principal) => principal,
        Err(err) => return ApiError::from(err).into_response(),
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let viewer = match authenticate(&state, request.headers().get(AUTHORIZATION)) {
        Ok(principal) => Viewer(Some(principal)),
        Err(AuthError::Missing) => Viewer(None),
        Err(err) => {
            debug!(
                target = "blogo::http::auth",
                error = %err,
                "ignoring unusable bearer token on optional route"
            );
            Viewer(None)
        }
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

fn authenticate(state: &AppState, header: Option<&HeaderValue>) -> Result<Principal, AuthError> {
    let token = extract_token(header).ok_or(AuthError::Missing)?;
    state.tokens.verify(token).map(Principal::from)
}

fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then_some(bearer)
}
