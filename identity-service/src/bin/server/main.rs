use std::sync::Arc;

use anyhow::Context;
use auth::Authenticator;
use identity_service::config::Config;
use identity_service::identity::authenticator::RequestAuthenticator;
use identity_service::identity::ports::SessionServicePort;
use identity_service::identity::service::SessionService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::PostgresCredentialStore;
use identity_service::principal::models::EmailAddress;
use identity_service::principal::models::PlainPassword;
use identity_service::principal::service::PrincipalService;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load().context("Failed to load configuration")?;

    tracing::info!(
        http_port = config.server.http_port,
        access_token_minutes = config.jwt.access_token_expire_minutes,
        admin_access_token_hours = config.jwt.admin_access_token_expire_hours,
        refresh_token_days = config.jwt.refresh_token_expire_days,
        user_route_policy = ?config.access.user_route_policy,
        "Configuration loaded"
    );

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.jwt.lifetimes())
            .context("Token signing secret is not usable")?,
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool));

    let session_service = Arc::new(SessionService::new(
        Arc::clone(&credential_store),
        Arc::clone(&authenticator),
    ));
    let principal_service = Arc::new(PrincipalService::new(Arc::clone(&credential_store)));
    let request_authenticator = Arc::new(RequestAuthenticator::new(
        Arc::clone(&credential_store),
        Arc::clone(&authenticator),
    ));

    if let Some(admin) = &config.admin {
        let email = EmailAddress::new(&admin.email).context("Invalid admin.email")?;
        let password =
            PlainPassword::new(admin.password.clone()).context("Invalid admin.password")?;
        session_service
            .provision_admin(email, password, admin.name.clone())
            .await
            .context("Failed to provision admin account")?;
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        session_service,
        principal_service,
        request_authenticator,
        config.access.clone(),
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
