use gateway::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: i64) -> Self { Self::NotFound(format!("{entity} {id}")) }

    pub fn required(field: &str) -> Self { Self::Validation(format!("{field} is required")) }

    /// Message suitable for an inline form error or a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_show_normalized_message() {
        let err: ServiceError = ApiError { status: Some(500), message: "500: Error del servidor".into() }.into();
        assert_eq!(err.user_message(), "500: Error del servidor");
        assert_eq!(err.to_string(), "500: Error del servidor");
    }

    #[test]
    fn helpers_format_messages() {
        assert_eq!(ServiceError::not_found("client", 7).to_string(), "not found: client 7");
        assert_eq!(ServiceError::required("plate").user_message(), "validation error: plate is required");
    }
}
