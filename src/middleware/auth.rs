use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{Principal, TokenError, TokenService};
use crate::error::ApiError;

/// JWT authentication middleware: verifies the bearer token and inserts the
/// caller's `Principal` into the request extensions.
pub async fn jwt_auth_middleware(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(&tokens, request.headers())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Checks run in a fixed order so each failure has one stable message.
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<Principal, ApiError> {
    if !tokens.is_configured() {
        return Err(ApiError::unauthorized("authentication not configured"));
    }

    let token = extract_bearer(headers)?;
    let claims = tokens.verify(token).map_err(|e| {
        if let TokenError::Invalid(inner) = &e {
            debug!("Rejected token: {}", inner);
        }
        ApiError::unauthorized("invalid or expired")
    })?;

    Ok(Principal::from(claims))
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing token"))?;
    let malformed = || ApiError::unauthorized("malformed header");

    let value = value.to_str().map_err(|_| malformed())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }
    Ok(token)
}

/// Handlers take `Principal` directly; a route mounted without the
/// middleware fails closed.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("missing token"))
    }
}
