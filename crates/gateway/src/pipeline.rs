//! Request/response pipeline.
//!
//! A call runs every [`RequestStage`] in order before dispatch and every
//! [`ResponseStage`] in order after it. A response stage may ask for the
//! identical request to be sent again by returning [`Flow::Resend`]; the
//! remaining stages are then skipped for that attempt.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::endpoint::with_query;
use crate::error::GatewayError;

/// Per-call state, created when a call is issued and dropped once it resolves.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: Uuid,
    pub method: Method,
    /// Path relative to the base URL, query included.
    pub path: String,
    /// Absolute URL, filled in by the client before the request stages run.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Automatic resends performed so far.
    pub retry_count: u32,
    /// Set once a 401 has been handled for this call.
    pub retry: bool,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            url: String::new(),
            headers: HeaderMap::new(),
            body: None,
            retry_count: 0,
            retry: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.path = with_query(&self.path, query);
        self
    }

    /// Only GET is treated as safe to resend.
    pub fn is_idempotent(&self) -> bool {
        self.method == Method::GET
    }

    pub(crate) fn resolve(&mut self, base_url: &str) {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        self.url = format!("{}{}", base_url.trim_end_matches('/'), path);
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub url: String,
    /// Parsed JSON body; `Null` when empty, a JSON string when not valid JSON.
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        serde_json::from_value(self.body)
            .map_err(|e| GatewayError::Request(format!("invalid response body: {e}")))
    }
}

pub type Outcome = Result<ApiResponse, GatewayError>;

#[derive(Debug)]
pub enum Flow {
    Done(Outcome),
    Resend,
}

#[async_trait]
pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// May add headers; must not touch the body.
    async fn on_request(&self, ctx: &mut RequestContext);
}

#[async_trait]
pub trait ResponseStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow;
}

#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestStage>>,
    response: Vec<Arc<dyn ResponseStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request.push(Arc::new(stage));
        self
    }

    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response.push(Arc::new(stage));
        self
    }

    pub fn request_stage_names(&self) -> Vec<&'static str> {
        self.request.iter().map(|s| s.name()).collect()
    }

    pub fn response_stage_names(&self) -> Vec<&'static str> {
        self.response.iter().map(|s| s.name()).collect()
    }

    pub async fn prepare(&self, ctx: &mut RequestContext) {
        for stage in &self.request {
            stage.on_request(ctx).await;
        }
    }

    pub async fn complete(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
        let mut current = outcome;
        for stage in &self.response {
            match stage.on_response(ctx, current).await {
                Flow::Done(next) => current = next,
                Flow::Resend => return Flow::Resend,
            }
        }
        Flow::Done(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    struct Tag(&'static str);

    #[async_trait]
    impl RequestStage for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn on_request(&self, ctx: &mut RequestContext) {
            ctx.headers.append("x-stage", HeaderValue::from_static(self.0));
        }
    }

    struct FailWith(u16);

    #[async_trait]
    impl ResponseStage for FailWith {
        fn name(&self) -> &'static str {
            "fail"
        }

        async fn on_response(&self, _ctx: &mut RequestContext, _outcome: Outcome) -> Flow {
            Flow::Done(Err(GatewayError::Status { status: self.0, body: Value::Null }))
        }
    }

    struct ResendOnce;

    #[async_trait]
    impl ResponseStage for ResendOnce {
        fn name(&self) -> &'static str {
            "resend"
        }

        async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
            if ctx.retry_count == 0 {
                ctx.retry_count += 1;
                return Flow::Resend;
            }
            Flow::Done(outcome)
        }
    }

    fn ok_outcome() -> Outcome {
        Ok(ApiResponse { status: 200, url: "http://x/".into(), body: Value::Null })
    }

    #[tokio::test]
    async fn request_stages_run_in_order() {
        let pipeline = Pipeline::new().with_request_stage(Tag("first")).with_request_stage(Tag("second"));
        let mut ctx = RequestContext::get("/client");
        pipeline.prepare(&mut ctx).await;
        let seen: Vec<_> = ctx.headers.get_all("x-stage").iter().map(|v| v.to_str().unwrap().to_string()).collect();
        assert_eq!(seen, vec!["first", "second"]);
        assert_eq!(pipeline.request_stage_names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn response_stages_feed_each_other() {
        let pipeline = Pipeline::new().with_response_stage(FailWith(500)).with_response_stage(FailWith(418));
        let mut ctx = RequestContext::get("/client");
        match pipeline.complete(&mut ctx, ok_outcome()).await {
            Flow::Done(Err(e)) => assert_eq!(e.status(), Some(418)),
            other => panic!("unexpected flow {other:?}"),
        }
    }

    #[tokio::test]
    async fn resend_short_circuits_later_stages() {
        let pipeline = Pipeline::new().with_response_stage(ResendOnce).with_response_stage(FailWith(500));
        let mut ctx = RequestContext::get("/client");
        assert!(matches!(pipeline.complete(&mut ctx, ok_outcome()).await, Flow::Resend));
        assert!(matches!(pipeline.complete(&mut ctx, ok_outcome()).await, Flow::Done(Err(_))));
    }

    #[test]
    fn resolve_joins_base_and_path() {
        let mut ctx = RequestContext::get("client").with_query("page=1");
        ctx.resolve("http://localhost:3000/api/");
        assert_eq!(ctx.url, "http://localhost:3000/api/client?page=1");
    }

    #[test]
    fn only_get_is_idempotent() {
        assert!(RequestContext::get("/client").is_idempotent());
        assert!(!RequestContext::new(Method::POST, "/client").is_idempotent());
        assert!(!RequestContext::new(Method::DELETE, "/client/1").is_idempotent());
    }

    #[test]
    fn response_json_reports_shape_mismatch() {
        let resp = ApiResponse { status: 200, url: String::new(), body: serde_json::json!({"id": "x"}) };
        #[derive(serde::Deserialize, Debug)]
        struct Item {
            #[allow(dead_code)]
            id: i64,
        }
        let err = resp.json::<Item>().unwrap_err();
        assert!(err.to_string().starts_with("invalid response body"));
    }
}
