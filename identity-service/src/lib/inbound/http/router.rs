use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::admin_sign_in::admin_sign_in;
use super::handlers::current_principal::current_principal;
use super::handlers::health::health;
use super::handlers::logout::logout;
use super::handlers::moderation::activate_user;
use super::handlers::moderation::deactivate_user;
use super::handlers::moderation::grant_creator;
use super::handlers::moderation::revoke_creator;
use super::handlers::profile::change_password;
use super::handlers::profile::get_profile;
use super::handlers::refresh::refresh;
use super::handlers::sign_in::sign_in;
use super::handlers::sign_up::sign_up;
use super::middleware::authenticate;
use super::middleware::require_admin;
use super::middleware::require_user;
use crate::config::AccessConfig;
use crate::identity::authenticator::RequestAuthenticator;
use crate::identity::service::SessionService;
use crate::outbound::repositories::PostgresCredentialStore;
use crate::principal::service::PrincipalService;

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService<PostgresCredentialStore>>,
    pub principal_service: Arc<PrincipalService<PostgresCredentialStore>>,
    pub request_authenticator: Arc<RequestAuthenticator<PostgresCredentialStore>>,
    pub access: Arc<AccessConfig>,
}

pub fn create_router(
    session_service: Arc<SessionService<PostgresCredentialStore>>,
    principal_service: Arc<PrincipalService<PostgresCredentialStore>>,
    request_authenticator: Arc<RequestAuthenticator<PostgresCredentialStore>>,
    access: AccessConfig,
) -> Router {
    let user_route_policy = access.user_route_policy;
    let state = AppState {
        session_service,
        principal_service,
        request_authenticator,
        access: Arc::new(access),
    };

    let auth_routes = Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/admin/signin", post(admin_sign_in))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_principal));

    let user_routes = Router::new()
        .route("/api/v1/users/profile", get(get_profile))
        .route("/api/v1/users/profile/password", put(change_password))
        .route_layer(middleware::from_fn_with_state(
            user_route_policy,
            require_user,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/manage/users/:user_id/deactivate",
            post(deactivate_user),
        )
        .route(
            "/api/v1/admin/manage/users/:user_id/activate",
            post(activate_user),
        )
        .route(
            "/api/v1/admin/manage/creators/:user_id/grant-creator-status",
            post(grant_creator),
        )
        .route(
            "/api/v1/admin/manage/creators/:user_id/remove-creator-status",
            post(revoke_creator),
        )
        .route_layer(middleware::from_fn(require_admin));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
