use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::session::LOGIN_ROUTE;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Outcome of a failed desk operation, already shaped for display.
///
/// Every variant renders as a message a resident can read.
/// `AuthenticationRequired` additionally sends the caller back to the login
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{reason}")]
    AuthenticationRequired { reason: String },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn no_session() -> Self {
        Self::AuthenticationRequired {
            reason: "no active session".to_string(),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::AuthenticationRequired {
            reason: "Not authenticated".to_string(),
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(self, Self::AuthenticationRequired { .. })
    }

    /// Route the screen layer should replace the current one with.
    pub fn redirect(&self) -> Option<&'static str> {
        self.requires_login().then_some(LOGIN_ROUTE)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(value: GatewayError) -> Self {
        if value.is_session_rejected() {
            return Self::AuthenticationRequired {
                reason: value.to_string(),
            };
        }

        match value {
            GatewayError::Validation(message) => Self::Validation(message),
            GatewayError::NotFound(message) => Self::NotFound(message),
            GatewayError::Network(message) | GatewayError::Auth(message) => {
                Self::Network(message)
            }
            malformed @ GatewayError::Malformed(_) => Self::Network(malformed.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self.redirect() {
            Some(redirect) => json!({ "error": self.to_string(), "redirect": redirect }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Service(err) => write!(f, "desk error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Service(err) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_tokens_require_login() {
        let err = ServiceError::from(GatewayError::Network("JWT expired".to_string()));
        assert_eq!(
            err,
            ServiceError::AuthenticationRequired {
                reason: "JWT expired".to_string()
            }
        );
        assert_eq!(err.redirect(), Some("/login"));
    }

    #[test]
    fn gateway_failures_keep_their_message() {
        let err = ServiceError::from(GatewayError::Network("connection refused".to_string()));
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.redirect().is_none());

        let err = ServiceError::from(GatewayError::Malformed("missing field `id`".to_string()));
        assert!(matches!(err, ServiceError::Network(ref message) if message.contains("missing field")));
    }

    #[test]
    fn service_errors_map_to_http_status() {
        assert_eq!(
            ServiceError::no_session().into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Validation("title is required".to_string())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::NotFound("Profile not found".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Config(ConfigError::InvalidPort)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
