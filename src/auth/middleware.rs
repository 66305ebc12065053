// Authentication middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{error::AuthError, token::TokenService};

/// Principal attached to a request once its bearer token has been verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
///
/// An absent header is `MissingToken`; anything else that is not a
/// non-empty bearer token is `InvalidToken`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidToken)?;

    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

/// Verify the request's bearer token and resolve the principal it names
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.validate_token(token)?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id()?,
    })
}

/// Middleware gating every protected route
///
/// On success the `AuthenticatedUser` is stored in the request extensions
/// and the request continues; otherwise the request ends here with 401.
/// Tokens are never renewed or rotated.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let user = authenticate(request.headers(), &tokens).map_err(|e| {
        warn!("Rejected request to protected endpoint {}: {}", endpoint, e);
        e
    })?;

    debug!("Authenticated user_id={} for endpoint={}", user.user_id, endpoint);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for handlers behind `require_auth`
///
/// Fails closed with `MissingToken` if the middleware did not run.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}
