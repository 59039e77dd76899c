use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::auth::AuthContext;
use crate::config::GatewayConfig;
use crate::endpoint::build_query;
use crate::error::{normalize_error, ApiError, GatewayError};
use crate::observability::{FAILED_REQUESTS_TOTAL, REQUESTS_TOTAL, REQUEST_DURATION};
use crate::pipeline::{ApiResponse, Flow, Outcome, Pipeline, RequestContext};
use crate::session::{SessionEvent, SessionEvents};

/// The single client every feature service calls through.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    pipeline: Pipeline,
    auth: AuthContext,
    events: SessionEvents,
}

pub struct ApiClientBuilder {
    config: GatewayConfig,
    auth: AuthContext,
    events: Option<SessionEvents>,
    pipeline: Option<Pipeline>,
}

impl ApiClientBuilder {
    pub fn events(mut self, events: SessionEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the standard stages entirely.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn build(self) -> Result<ApiClient, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Request(format!("failed to build http client: {e}")))?;

        let events = self.events.unwrap_or_default();
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| Pipeline::standard(&self.config, &self.auth, &events));

        Ok(ApiClient {
            http,
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            pipeline,
            auth: self.auth,
            events,
        })
    }
}

impl ApiClient {
    pub fn builder(config: GatewayConfig, auth: AuthContext) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            auth,
            events: None,
            pipeline: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Run `ctx` through the pipeline until a stage settles it.
    pub async fn execute(&self, mut ctx: RequestContext) -> Result<ApiResponse, GatewayError> {
        ctx.resolve(&self.base_url);
        REQUESTS_TOTAL.inc();
        loop {
            self.pipeline.prepare(&mut ctx).await;
            let outcome = self.dispatch(&ctx).await;
            match self.pipeline.complete(&mut ctx, outcome).await {
                Flow::Done(result) => {
                    if result.is_err() {
                        FAILED_REQUESTS_TOTAL.inc();
                    }
                    return result;
                }
                Flow::Resend => continue,
            }
        }
    }

    async fn dispatch(&self, ctx: &RequestContext) -> Outcome {
        let mut request = self
            .http
            .request(ctx.method.clone(), &ctx.url)
            .headers(ctx.headers.clone());
        if let Some(body) = &ctx.body {
            request = request.json(body);
        }

        let started = Instant::now();
        let sent = request.send().await;
        REQUEST_DURATION.observe(started.elapsed().as_secs_f64());
        let response = sent.map_err(GatewayError::from_reqwest)?;

        let status = response.status();
        let url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Request(format!("failed to read response body: {e}")))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        debug!(request_id = %ctx.id, status = status.as_u16(), %url, "dispatch finished");

        if status.is_success() {
            Ok(ApiResponse { status: status.as_u16(), url, body })
        } else {
            Err(GatewayError::Status { status: status.as_u16(), body })
        }
    }

    /// Execute and decode, normalizing every failure.
    pub async fn request<T: DeserializeOwned>(&self, ctx: RequestContext) -> Result<T, ApiError> {
        let response = self.execute(ctx).await.map_err(|e| normalize_error(&e))?;
        response.json().map_err(|e| normalize_error(&e))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestContext::get(path)).await
    }

    /// GET with `params` rendered through [`build_query`].
    pub async fn get_with_query<T: DeserializeOwned>(&self, path: &str, params: &Value) -> Result<T, ApiError> {
        self.request(RequestContext::get(path).with_query(&build_query(params))).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestContext::new(Method::DELETE, path)).await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| normalize_error(&GatewayError::Request(format!("invalid request body: {e}"))))?;
        self.request(RequestContext::new(method, path).with_body(body)).await
    }
}
