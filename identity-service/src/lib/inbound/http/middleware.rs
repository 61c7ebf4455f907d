use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::identity::authorization::AccessRequirement;
use crate::identity::authorization::UserRoutePolicy;
use crate::identity::context::IdentityContext;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

/// Validates the bearer token of every non-public request and attaches the
/// resulting `IdentityContext` to the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.access.is_public(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = extract_bearer_token(req.headers())
        .map_err(|e| reject(req.uri().path(), e))?
        .to_string();

    let identity = state
        .request_authenticator
        .authenticate(&token)
        .await
        .map_err(|e| reject(req.uri().path(), e))?;

    tracing::debug!(
        principal_id = %identity.principal_id,
        role = %identity.role,
        "Request authenticated"
    );

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

fn reject(path: &str, err: AuthError) -> ApiError {
    if err.is_authentication_failure() {
        tracing::warn!(path = %path, reason = %err, "Request authentication rejected");
    }
    ApiError::from(err)
}

/// Header must be exactly `Bearer <token>`: scheme case-insensitive, two
/// whitespace-separated parts.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

fn authorize(req: &Request, requirement: AccessRequirement) -> Result<(), ApiError> {
    requirement
        .check(req.extensions().get::<IdentityContext>())
        .map_err(|e| {
            if e == AuthError::Forbidden {
                tracing::warn!(path = %req.uri().path(), requirement = ?requirement, "Access denied");
            }
            ApiError::from(e)
        })
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&req, AccessRequirement::Admin)?;
    Ok(next.run(req).await)
}

pub async fn require_creator(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&req, AccessRequirement::Creator)?;
    Ok(next.run(req).await)
}

pub async fn require_user(
    State(policy): State<UserRoutePolicy>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&req, AccessRequirement::User(policy))?;
    Ok(next.run(req).await)
}

/// Extractor for the identity attached by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub IdentityContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| ApiError::from(AuthError::MissingToken))
    }
}
