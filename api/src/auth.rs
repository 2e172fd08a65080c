//! Token authentication: `Authorization: Token <key>`.

use crate::{ApiError, AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use little_lemon_service::{account, sea_orm::DatabaseConnection, Caller};
use tracing::debug;

/// Extracts the authenticated caller, rejecting anonymous requests
#[derive(Clone, Debug)]
pub struct AuthUser(pub Caller);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(Self(caller.clone()));
        }

        match resolve_caller(&state.conn, &parts.headers).await? {
            Some(caller) => Ok(Self(caller)),
            None => Err(ApiError::Unauthenticated),
        }
    }
}

/// Let safe methods through anonymously; everything else needs a caller.
/// A resolved caller is stashed in the request extensions for [`AuthUser`].
pub async fn require_auth_for_writes(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&state.conn, request.headers()).await?;

    match caller {
        Some(caller) => {
            request.extensions_mut().insert(caller);
        }
        None if requires_authentication(request.method()) => {
            debug!(method = %request.method(), uri = %request.uri(), "anonymous write refused");
            return Err(ApiError::Unauthenticated);
        }
        None => {}
    }

    Ok(next.run(request).await)
}

pub fn requires_authentication(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// `Ok(None)` when no credentials were sent, an error when they are unusable
async fn resolve_caller(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> Result<Option<Caller>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .ok()
        .and_then(token_key)
        .ok_or(ApiError::InvalidToken)?;

    match account::authenticate(db, key).await? {
        Some(caller) => Ok(Some(caller)),
        None => Err(ApiError::InvalidToken),
    }
}

fn token_key(header: &str) -> Option<&str> {
    let (scheme, key) = header.split_once(' ')?;
    let key = key.trim();

    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty()).then_some(key)
}
