//! Gateway error types and the normalization every caller sees.
//!
//! [`GatewayError`] is what flows through the response pipeline; stages look
//! at it to decide on retries and session expiry. Feature code never matches
//! on it directly but receives the flattened [`ApiError`] built by
//! [`normalize_error`].

use serde_json::Value;
use thiserror::Error;

/// Used when the server answered without a usable message.
pub const SERVER_ERROR_FALLBACK: &str = "Error del servidor";
/// Used when the request went out and nothing came back.
pub const CONNECTIVITY_MESSAGE: &str = "No se pudo conectar con el servidor. Verifica tu conexión.";
/// Used when an error carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Error inesperado";

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status { status: u16, body: Value },
    /// The request was dispatched but no response arrived (refused, reset, timed out).
    #[error("no response received: {0}")]
    NoResponse(String),
    /// Failure before dispatch or while reading an otherwise delivered response.
    #[error("{0}")]
    Request(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::NoResponse(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message the backend put in the error body, if any.
    ///
    /// Looks at `message` first and then `error`; a plain string body is taken as is.
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let text = match body {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| map.get("error").and_then(Value::as_str)),
            _ => None,
        };
        text.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::Request(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status { status: status.as_u16(), body: Value::Null };
        }
        if err.is_decode() {
            return Self::Request(err.to_string());
        }
        Self::NoResponse(err.to_string())
    }
}

/// Error surfaced to feature services and screens.
///
/// `message` is always one of the three normalized forms; `status` is kept so
/// callers can branch on 404 and the like without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        normalize_error(&err)
    }
}

/// Flatten any gateway failure into the caller-facing shape.
pub fn normalize_error(err: &GatewayError) -> ApiError {
    match err {
        GatewayError::Status { status, .. } => {
            let message = err
                .server_message()
                .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string());
            ApiError {
                status: Some(*status),
                message: format!("{status}: {message}"),
            }
        }
        GatewayError::NoResponse(_) => ApiError::new(CONNECTIVITY_MESSAGE),
        GatewayError::Request(message) if message.trim().is_empty() => {
            ApiError::new(UNKNOWN_ERROR_MESSAGE)
        }
        GatewayError::Request(message) => ApiError::new(message.clone()),
    }
}
