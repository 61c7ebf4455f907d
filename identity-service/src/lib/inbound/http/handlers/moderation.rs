use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::PrincipalData;
use crate::inbound::http::router::AppState;
use crate::principal::models::PrincipalId;
use crate::principal::models::User;
use crate::principal::ports::PrincipalServicePort;

fn parse_user_id(raw: &str) -> Result<PrincipalId, ApiError> {
    PrincipalId::from_string(raw).map_err(|e| ApiError::UnprocessableEntity(e.to_string()))
}

fn respond(user: &User) -> ApiSuccess<PrincipalData> {
    ApiSuccess::new(StatusCode::OK, user.into())
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let user = state.principal_service.deactivate_user(&user_id).await?;
    Ok(respond(&user))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let user = state.principal_service.activate_user(&user_id).await?;
    Ok(respond(&user))
}

pub async fn grant_creator(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let user = state.principal_service.grant_creator(&user_id).await?;
    Ok(respond(&user))
}

pub async fn revoke_creator(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let user = state.principal_service.revoke_creator(&user_id).await?;
    Ok(respond(&user))
}
