use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::identity::models::SignUpCommand;
use crate::identity::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .session_service
        .sign_up(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref grant| ApiSuccess::new(StatusCode::CREATED, grant.into()))
}

/// HTTP request body for registering a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignUpRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    phone_no: Option<String>,
}

impl SignUpRequest {
    fn try_into_command(self) -> Result<SignUpCommand, ApiError> {
        SignUpCommand::new(&self.email, self.password, self.name, self.phone_no)
            .map_err(ApiError::from)
    }
}
