//! Login and logout: the only places the stored token is set or dropped on purpose.

use std::sync::Arc;

use gateway::{ApiClient, SessionEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;

pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.email.trim().is_empty() {
            return Err(ServiceError::required("email"));
        }
        if self.password.is_empty() {
            return Err(ServiceError::required("password"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ServiceError> {
        credentials.validate()?;
        let response: LoginResponse = self.client.post(LOGIN_PATH, credentials).await?;
        if response.token.trim().is_empty() {
            return Err(ServiceError::Validation("login response carried no token".into()));
        }
        self.client
            .auth()
            .set_token(response.token.clone())
            .await
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        self.client.events().emit(SessionEvent::LoggedIn);
        info!("logged in");
        Ok(response)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.client.auth().clear_token().await {
            warn!(error = %e, "failed to clear auth token on logout");
        }
        self.client.events().emit(SessionEvent::LoggedOut);
        info!("logged out");
    }

    pub async fn is_logged_in(&self) -> bool {
        self.client.auth().is_authenticated().await
    }
}
