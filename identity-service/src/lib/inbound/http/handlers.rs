use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::identity::errors::AuthError;
use crate::identity::models::PrincipalProfile;
use crate::identity::models::SessionGrant;
use crate::principal::models::User;

pub mod admin_sign_in;
pub mod current_principal;
pub mod health;
pub mod logout;
pub mod moderation;
pub mod profile;
pub mod refresh;
pub mod sign_in;
pub mod sign_up;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    ServiceUnavailable(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        let mut response =
            (status, Json(ApiResponseBody::new_error(status, message))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthorized(err.to_string()),
            AuthError::ExpiredToken
            | AuthError::MalformedOrForged(_)
            | AuthError::IdentityNotFound(_)
            | AuthError::PrincipalInactive(_) => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Forbidden | AuthError::AccountDisabled => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::DuplicateIdentity => ApiError::BadRequest(err.to_string()),
            AuthError::PrincipalNotFound(_) => ApiError::NotFound("User not found".to_string()),
            AuthError::Validation(msg) => ApiError::UnprocessableEntity(msg),
            AuthError::StorageUnavailable(_) => {
                ApiError::ServiceUnavailable("Service temporarily unavailable".to_string())
            }
            AuthError::StorageError(_) | AuthError::Internal(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

/// Public view of a user or admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalData {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone_no: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub is_creator: bool,
    pub is_admin: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PrincipalData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.clone(),
            phone_no: user.phone_no.clone(),
            profile_pic: user.profile_pic.clone(),
            is_active: user.is_active,
            is_creator: user.is_creator,
            is_admin: false,
            role: user.role().to_string(),
            created_at: user.created_at,
        }
    }
}

impl From<&PrincipalProfile> for PrincipalData {
    fn from(profile: &PrincipalProfile) -> Self {
        match profile {
            PrincipalProfile::User(user) => user.into(),
            PrincipalProfile::Admin(admin) => Self {
                id: admin.id.to_string(),
                email: admin.email.as_str().to_string(),
                name: admin.name.clone(),
                phone_no: None,
                profile_pic: None,
                is_active: admin.is_active,
                is_creator: false,
                is_admin: true,
                role: profile.role().to_string(),
                created_at: admin.created_at,
            },
        }
    }
}

/// Principal half of a session body, keyed `user` or `admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPrincipal {
    User(PrincipalData),
    Admin(PrincipalData),
}

/// Body returned by sign-up and both sign-in routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    #[serde(flatten)]
    pub principal: SessionPrincipal,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionGrant> for SessionResponseData {
    fn from(grant: &SessionGrant) -> Self {
        let data = PrincipalData::from(&grant.principal);
        let principal = match &grant.principal {
            PrincipalProfile::User(_) => SessionPrincipal::User(data),
            PrincipalProfile::Admin(_) => SessionPrincipal::Admin(data),
        };

        Self {
            principal,
            access_token: grant.tokens.access_token.clone(),
            refresh_token: grant.tokens.refresh_token.clone(),
            token_type: "bearer",
            expires_at: grant.tokens.access_expires_at,
        }
    }
}
