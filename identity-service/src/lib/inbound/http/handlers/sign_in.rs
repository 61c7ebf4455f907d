use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::identity::errors::AuthError;
use crate::identity::models::SignInCommand;
use crate::identity::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .session_service
        .sign_in(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref grant| ApiSuccess::new(StatusCode::OK, grant.into()))
}

/// HTTP request body for email + password sign-in, shared with admin sign-in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}

impl SignInRequest {
    /// An address that cannot be registered cannot sign in either.
    pub(super) fn try_into_command(self) -> Result<SignInCommand, ApiError> {
        SignInCommand::new(&self.email, self.password)
            .map_err(|_| ApiError::from(AuthError::InvalidCredentials))
    }
}
