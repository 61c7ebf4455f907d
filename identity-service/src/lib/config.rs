use std::env;

use auth::TokenLifetimes;
use config::builder::DefaultState;
use config::Config as ConfigBuilder;
use config::ConfigBuilder as Builder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::identity::authorization::UserRoutePolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub access: AccessConfig,
    /// Admin account created at startup when present
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_admin_access_hours")]
    pub admin_access_token_expire_hours: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expire_days: i64,
}

impl JwtConfig {
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            user_access: chrono::Duration::minutes(self.access_token_expire_minutes),
            admin_access: chrono::Duration::hours(self.admin_access_token_expire_hours),
            refresh: chrono::Duration::days(self.refresh_token_expire_days),
        }
    }
}

/// Which paths bypass authentication, and how plain-user routes treat admins.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    #[serde(default)]
    pub user_route_policy: UserRoutePolicy,
}

impl AccessConfig {
    /// A prefix matches the exact path or the path followed by `/`.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            public_prefixes: default_public_prefixes(),
            user_route_policy: UserRoutePolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_minutes() -> i64 {
    30
}

fn default_admin_access_hours() -> i64 {
    8
}

fn default_refresh_days() -> i64 {
    7
}

fn default_public_prefixes() -> Vec<String> {
    [
        "/health",
        "/docs",
        "/redoc",
        "/openapi.json",
        "/auth/signup",
        "/auth/signin",
        "/auth/admin/signin",
        "/auth/refresh",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const MAX_ACCESS_MINUTES: i64 = 24 * 60;
const MAX_ADMIN_ACCESS_HOURS: i64 = 7 * 24;
const MAX_REFRESH_DAYS: i64 = 365;

/// Flat variable names still honoured on top of the structured keys.
const LEGACY_VARIABLES: [(&str, &str); 4] = [
    ("SECRET_KEY", "jwt.secret"),
    ("ACCESS_TOKEN_EXPIRE_MINUTES", "jwt.access_token_expire_minutes"),
    ("REFRESH_TOKEN_EXPIRE_DAYS", "jwt.refresh_token_expire_days"),
    ("DATABASE_URL", "database.url"),
];

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy flat variables (SECRET_KEY, DATABASE_URL, ...)
    /// 2. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    ///
    /// # Errors
    /// Fails when a source cannot be read, a value has the wrong type, or no
    /// signing secret is configured.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(
                Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("access.public_prefixes")
                    .try_parsing(true),
            );

        for (variable, key) in LEGACY_VARIABLES {
            builder = builder.set_override_option(key, env::var(variable).ok())?;
        }

        Self::from_builder(builder)
    }

    fn from_builder(builder: Builder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret is not set (use JWT__SECRET or SECRET_KEY)".to_string(),
            ));
        }

        let lifetimes = [
            (
                "jwt.access_token_expire_minutes",
                self.jwt.access_token_expire_minutes,
                MAX_ACCESS_MINUTES,
            ),
            (
                "jwt.admin_access_token_expire_hours",
                self.jwt.admin_access_token_expire_hours,
                MAX_ADMIN_ACCESS_HOURS,
            ),
            (
                "jwt.refresh_token_expire_days",
                self.jwt.refresh_token_expire_days,
                MAX_REFRESH_DAYS,
            ),
        ];
        for (key, value, max) in lifetimes {
            if !(1..=max).contains(&value) {
                return Err(ConfigError::Message(format!(
                    "{} must be between 1 and {}, got {}",
                    key, max, value
                )));
            }
        }

        Ok(())
    }
}
