use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::sign_in::SignInRequest;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::identity::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

pub async fn admin_sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .session_service
        .admin_sign_in(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref grant| ApiSuccess::new(StatusCode::OK, grant.into()))
}
