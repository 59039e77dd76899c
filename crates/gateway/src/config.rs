use configs::ApiConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout: TimeoutConfig,
    pub retry: RetryConfig,
    pub dev_logging: bool,
    pub token_store_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_api_config(&ApiConfig::default())
    }
}

impl GatewayConfig {
    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            timeout: TimeoutConfig {
                request_timeout_secs: api.timeout_secs,
            },
            retry: RetryConfig {
                enabled: api.retry_attempts > 0,
                max_attempts: api.retry_attempts,
                delay_ms: api.retry_delay_ms,
            },
            dev_logging: api.dev_logging,
            token_store_path: api.token_store_path.clone(),
        }
    }

    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Same configuration pointed at another backend.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shop_client_settings() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry_delay(), Duration::from_secs(1));
        assert!(cfg.retry.enabled);
    }

    #[test]
    fn zero_attempts_disables_retry() {
        let api = ApiConfig { retry_attempts: 0, ..ApiConfig::default() };
        let cfg = GatewayConfig::from_api_config(&api);
        assert!(!cfg.retry.enabled);
    }

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let cfg = GatewayConfig::default().with_base_url("http://127.0.0.1:4000/");
        assert_eq!(cfg.base_url, "http://127.0.0.1:4000");
    }

    #[test]
    fn load_from_file_reads_json() {
        let path = std::env::temp_dir().join(format!("gateway_cfg_{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::json!({
            "base_url": "http://10.0.0.2:8080",
            "timeout": { "request_timeout_secs": 12 },
            "retry": { "enabled": false, "max_attempts": 0, "delay_ms": 0 },
            "dev_logging": true,
            "token_store_path": "tmp/session.json"
        });
        std::fs::write(&path, json.to_string()).unwrap();
        let cfg = GatewayConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.2:8080");
        assert_eq!(cfg.timeout(), Duration::from_secs(12));
        assert!(!cfg.retry.enabled);
        assert!(cfg.dev_logging);
        let _ = std::fs::remove_file(&path);
    }
}
