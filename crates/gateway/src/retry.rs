use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::observability::RETRIES_TOTAL;
use crate::pipeline::{Flow, Outcome, RequestContext, ResponseStage};

/// Fixed-delay resend policy for idempotent reads that never got a response.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, enabled: bool) -> Self {
        Self {
            max_attempts,
            delay,
            enabled,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.retry.max_attempts,
            config.retry_delay(),
            config.retry.enabled,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resends allowed per call, on top of the first attempt.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts
        } else {
            0
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait_before_retry(&self) {
        if !self.enabled || self.delay.is_zero() {
            return;
        }
        sleep(self.delay).await;
    }

    pub fn should_retry(&self, ctx: &RequestContext, error: &GatewayError) -> bool {
        if !self.enabled || !ctx.is_idempotent() || !error.is_no_response() {
            return false;
        }

        if ctx.retry_count >= self.max_attempts {
            warn!(
                request_id = %ctx.id,
                url = %ctx.url,
                attempts = ctx.retry_count,
                "max retry attempts reached"
            );
            return false;
        }

        true
    }
}

/// Response stage that resends GETs which failed without any HTTP response.
pub struct RetryStage {
    policy: RetryPolicy,
}

impl RetryStage {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl ResponseStage for RetryStage {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn on_response(&self, ctx: &mut RequestContext, outcome: Outcome) -> Flow {
        let retry = match &outcome {
            Err(error) => self.policy.should_retry(ctx, error),
            Ok(_) => false,
        };
        if !retry {
            return Flow::Done(outcome);
        }

        ctx.retry_count += 1;
        RETRIES_TOTAL.inc();
        debug!(
            request_id = %ctx.id,
            url = %ctx.url,
            attempt = ctx.retry_count,
            max_attempts = self.policy.max_attempts(),
            delay_ms = self.policy.delay().as_millis() as u64,
            "retrying request after network failure"
        );
        self.policy.wait_before_retry().await;
        Flow::Resend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::Value;
    use std::time::Instant;

    fn network_error() -> Outcome {
        Err(GatewayError::NoResponse("connection refused".into()))
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(5), true)
    }

    #[tokio::test]
    async fn get_network_failure_is_resent_until_limit() {
        let stage = RetryStage::new(policy(3));
        let mut ctx = RequestContext::get("/client");

        for expected in 1..=3 {
            assert!(matches!(stage.on_response(&mut ctx, network_error()).await, Flow::Resend));
            assert_eq!(ctx.retry_count, expected);
        }
        assert!(matches!(stage.on_response(&mut ctx, network_error()).await, Flow::Done(Err(_))));
        assert_eq!(ctx.retry_count, 3);
    }

    #[tokio::test]
    async fn non_get_is_never_resent() {
        let stage = RetryStage::new(policy(3));
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let mut ctx = RequestContext::new(method, "/client");
            assert!(matches!(stage.on_response(&mut ctx, network_error()).await, Flow::Done(Err(_))));
            assert_eq!(ctx.retry_count, 0);
        }
    }

    #[tokio::test]
    async fn server_errors_are_not_resent() {
        let stage = RetryStage::new(policy(3));
        let mut ctx = RequestContext::get("/client");
        let outcome = Err(GatewayError::Status { status: 503, body: Value::Null });
        assert!(matches!(stage.on_response(&mut ctx, outcome).await, Flow::Done(Err(_))));
        assert_eq!(ctx.retry_count, 0);
    }

    #[tokio::test]
    async fn disabled_policy_never_resends() {
        let stage = RetryStage::new(RetryPolicy::new(3, Duration::from_millis(1), false));
        let mut ctx = RequestContext::get("/client");
        assert!(matches!(stage.on_response(&mut ctx, network_error()).await, Flow::Done(Err(_))));
        assert_eq!(RetryPolicy::new(3, Duration::ZERO, false).max_attempts(), 0);
    }

    #[tokio::test]
    async fn resend_waits_fixed_delay() {
        let delay = Duration::from_millis(30);
        let stage = RetryStage::new(RetryPolicy::new(2, delay, true));
        let mut ctx = RequestContext::get("/client");

        for _ in 0..2 {
            let started = Instant::now();
            assert!(matches!(stage.on_response(&mut ctx, network_error()).await, Flow::Resend));
            assert!(started.elapsed() >= delay);
        }
    }
}
