use anyhow::anyhow;
use anyhow::Result;
use common::env::{env_flag, env_string, API_URL_VAR, CONFIG_PATH_VAR, DEV_FLAG_VAR};
use serde::Deserialize;

/// Backend used when neither the config file nor `MECANIX_API_URL` names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub app: AppSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub dev_logging: bool,
    #[serde(default = "default_token_store_path")]
    pub token_store_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay(),
            dev_logging: env_flag(DEV_FLAG_VAR),
            token_store_path: default_token_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    /// Serve client screens from the built-in sample data instead of the backend.
    #[serde(default)]
    pub use_mock_data: bool,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_base_url() -> String {
    env_string(API_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
fn default_timeout() -> u64 { 30 }
fn default_retry_attempts() -> u32 { 3 }
fn default_retry_delay() -> u64 { 1000 }
fn default_token_store_path() -> String { "data/session.json".to_string() }

pub fn load_default() -> Result<AppConfig> {
    let path = env_string(CONFIG_PATH_VAR).unwrap_or_else(|| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_overrides(None, false)
    }

    /// Env overrides first, then command-line ones, then a single validation.
    pub fn apply_overrides(&mut self, base_url: Option<&str>, dev_logging: bool) -> Result<()> {
        self.api.normalize_from_env();
        if let Some(url) = base_url {
            self.api.set_base_url(url);
        }
        if dev_logging {
            self.api.dev_logging = true;
        }
        self.api.validate()
    }
}

impl ApiConfig {
    /// Environment wins over the file: `MECANIX_API_URL` replaces `base_url`
    /// and `MECANIX_DEV` can only switch dev logging on.
    pub fn normalize_from_env(&mut self) {
        if let Some(url) = env_string(API_URL_VAR) {
            self.base_url = url;
        }
        let url = self.base_url.clone();
        self.set_base_url(&url);
        if env_flag(DEV_FLAG_VAR) {
            self.dev_logging = true;
        }
    }

    /// Trimmed, without trailing slash; blank falls back to the default.
    pub fn set_base_url(&mut self, url: &str) {
        let url = url.trim().trim_end_matches('/');
        self.base_url = if url.is_empty() { DEFAULT_BASE_URL.to_string() } else { url.to_string() };
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be a positive number of seconds"));
        }
        if self.token_store_path.trim().is_empty() {
            return Err(anyhow!("api.token_store_path must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.api.retry_attempts, 3);
        assert_eq!(cfg.api.retry_delay_ms, 1000);
        assert_eq!(cfg.api.token_store_path, "data/session.json");
        assert!(!cfg.app.use_mock_data);
    }

    #[test]
    fn explicit_values_are_read() {
        let cfg = parse(
            r#"
            [api]
            base_url = "https://shop.example.com/api/"
            timeout_secs = 5
            retry_attempts = 1
            retry_delay_ms = 250
            dev_logging = true

            [app]
            use_mock_data = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.timeout_secs, 5);
        assert_eq!(cfg.api.retry_attempts, 1);
        assert_eq!(cfg.api.retry_delay_ms, 250);
        assert!(cfg.api.dev_logging);
        assert!(cfg.app.use_mock_data);
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        let api = ApiConfig { base_url: "ftp://shop".into(), ..ApiConfig::default() };
        assert!(api.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let api = ApiConfig {
            base_url: "http://localhost:3000/api".into(),
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(api.validate().is_err());
    }

    #[test]
    fn normalize_trims_trailing_slash() {
        let mut api = ApiConfig { base_url: "http://localhost:9000/api/".into(), ..ApiConfig::default() };
        if env_string(API_URL_VAR).is_none() {
            api.normalize_from_env();
            assert_eq!(api.base_url, "http://localhost:9000/api");
        }
    }

    #[test]
    fn command_line_url_beats_file_and_env() {
        let mut cfg = parse("[api]\nbase_url = \"http://file:1/api\"\n").unwrap();
        cfg.apply_overrides(Some(" https://cli.example.com/api/ "), true).unwrap();
        assert_eq!(cfg.api.base_url, "https://cli.example.com/api");
        assert!(cfg.api.dev_logging);
    }

    #[test]
    fn invalid_command_line_url_is_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_overrides(Some("shop.local"), false).is_err());
    }
}
