//! The stages every client runs by default.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, error, info, warn};

use crate::auth::AuthContext;
use crate::config::GatewayConfig;
use crate::error::normalize_error;
use crate::observability::SESSION_EXPIRED_TOTAL;
use crate::pipeline::{Flow, Outcome, Pipeline, RequestContext, RequestStage, ResponseStage};
use crate::retry::{RetryPolicy, RetryStage};
use crate::session::{SessionEvent, SessionEvents};

/// Adds `Authorization: Bearer <token>` when a token is stored.
pub struct AuthHeaderStage {
    auth: AuthContext,
}

impl AuthHeaderStage {
    pub fn new(auth: AuthContext) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl RequestStage for AuthHeaderStage {
    fn name(&self) -> &'static str {
        "auth_header"
    }

    async fn on_request(&self, ctx: &mut RequestContext) {
        // A resend must carry the current token, not the previous attempt's.
        ctx.headers.remove(AUTHORIZATION);
        let Some(token) = self.auth.token().await else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                ctx.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!(request_id = %ctx.id, error = %e, "stored token is not a valid header value"),
        }
    }
}

pub struct RequestLogStage {
    enabled: bool,
}

impl RequestLogStage {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl RequestStage for RequestLogStage {
    fn name(&self) -> &'static str {
        "request_log"
    }

    async fn on_request(&self, ctx: &mut RequestContext) {
        if self.enabled {
            info!(
                request_id = %ctx.id,
                method = %ctx.method,
                url = %ctx.url,
                attempt = ctx.retry_count + 1,
                "api request"
            );
        }
    }
}

pub struct ResponseLogStage {
    enabled: bool,
}

impl ResponseLogStage {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ResponseStage for ResponseLogStage {
    fn name(&self) -> &'static str {
        "response_log"
    }

    async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
        if self.enabled {
            if let Ok(response) = &outcome {
                info!(
                    request_id = %ctx.id,
                    status = response.status,
                    url = %response.url,
                    "api response"
                );
            }
        }
        Flow::Done(outcome)
    }
}

/// On the first 401 of a call: clear the token and announce the expiry.
pub struct SessionExpiryStage {
    auth: AuthContext,
    events: SessionEvents,
}

impl SessionExpiryStage {
    pub fn new(auth: AuthContext, events: SessionEvents) -> Self {
        Self { auth, events }
    }
}

#[async_trait]
impl ResponseStage for SessionExpiryStage {
    fn name(&self) -> &'static str {
        "session_expiry"
    }

    async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
        let unauthorized = matches!(&outcome, Err(e) if e.is_unauthorized());
        if !unauthorized || ctx.retry {
            return Flow::Done(outcome);
        }

        ctx.retry = true;
        if let Err(e) = self.auth.clear_token().await {
            error!(request_id = %ctx.id, error = %e, "failed to clear auth token after 401");
        }
        SESSION_EXPIRED_TOTAL.inc();
        warn!(request_id = %ctx.id, url = %ctx.url, "session expired");
        self.events.emit(SessionEvent::Expired { url: ctx.url.clone() });
        Flow::Done(outcome)
    }
}

/// Structured log line for every failure that reaches the end of the pipeline.
pub struct ErrorLogStage;

#[async_trait]
impl ResponseStage for ErrorLogStage {
    fn name(&self) -> &'static str {
        "error_log"
    }

    async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
        if let Err(err) = &outcome {
            let normalized = normalize_error(err);
            match err.status() {
                Some(status) => warn!(
                    request_id = %ctx.id,
                    status,
                    message = %normalized.message,
                    url = %ctx.url,
                    method = %ctx.method,
                    "api error"
                ),
                None => error!(
                    request_id = %ctx.id,
                    message = %err,
                    url = %ctx.url,
                    method = %ctx.method,
                    retries = ctx.retry_count,
                    "api error"
                ),
            }
        } else {
            debug!(request_id = %ctx.id, "api call completed");
        }
        Flow::Done(outcome)
    }
}

impl Pipeline {
    /// Request: auth header, request log. Response: response log, session
    /// expiry, retry, error log.
    pub fn standard(config: &GatewayConfig, auth: &AuthContext, events: &SessionEvents) -> Self {
        Pipeline::new()
            .with_request_stage(AuthHeaderStage::new(auth.clone()))
            .with_request_stage(RequestLogStage::new(config.dev_logging))
            .with_response_stage(ResponseLogStage::new(config.dev_logging))
            .with_response_stage(SessionExpiryStage::new(auth.clone(), events.clone()))
            .with_response_stage(RetryStage::new(RetryPolicy::from_config(config)))
            .with_response_stage(ErrorLogStage)
    }
}
