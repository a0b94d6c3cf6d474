use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the desk.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    /// Hosted backend; `None` runs against the bundled in-memory gateway.
    pub gateway: Option<GatewayConfig>,
    pub account: AccountConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            gateway: GatewayConfig::from_env()?,
            account: AccountConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let raw_url = match env::var("APP_GATEWAY_URL") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };

        let base_url =
            Url::parse(raw_url.trim()).map_err(|source| ConfigError::InvalidGatewayUrl { source })?;

        let api_key = env::var("APP_GATEWAY_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingGatewayKey)?;

        let timeout_secs = match env::var("APP_GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidGatewayTimeout)?,
            Err(_) => Self::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Some(Self {
            base_url,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// Account flow settings and optional desk credentials used by the CLI.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub password_reset_redirect: String,
    pub credentials: Option<DeskCredentials>,
}

impl AccountConfig {
    fn from_env() -> Self {
        let password_reset_redirect = env::var("APP_PASSWORD_RESET_REDIRECT")
            .unwrap_or_else(|_| "https://example.com/reset-password".to_string());

        let credentials = match (env::var("APP_DESK_EMAIL"), env::var("APP_DESK_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() => Some(DeskCredentials {
                email: email.trim().to_string(),
                password,
            }),
            _ => None,
        };

        Self {
            password_reset_redirect,
            credentials,
        }
    }
}

#[derive(Clone)]
pub struct DeskCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for DeskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeskCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidGatewayUrl { source: url::ParseError },
    MissingGatewayKey,
    InvalidGatewayTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json' (got '{value}')")
            }
            ConfigError::InvalidGatewayUrl { .. } => {
                write!(f, "APP_GATEWAY_URL must be an absolute URL")
            }
            ConfigError::MissingGatewayKey => {
                write!(f, "APP_GATEWAY_KEY is required when APP_GATEWAY_URL is set")
            }
            ConfigError::InvalidGatewayTimeout => {
                write!(f, "APP_GATEWAY_TIMEOUT_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidGatewayUrl { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::MissingGatewayKey
            | ConfigError::InvalidGatewayTimeout => None,
        }
    }
}
