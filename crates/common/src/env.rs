//! Environment/runtime helpers
//!
//! Reads the handful of variables the shop client understands and makes
//! sure the local data directory exists before the token file is opened.

use std::path::Path;

use tracing::{debug, warn};

/// Base URL of the Mecanix REST backend.
pub const API_URL_VAR: &str = "MECANIX_API_URL";
/// Turns on per-request development logging.
pub const DEV_FLAG_VAR: &str = "MECANIX_DEV";
/// Path of the TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Load `.env` from the working directory if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to parse .env"),
    }
}

/// Read a variable, treating blank values as unset.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a boolean flag; unset or unparsable values are `false`.
pub fn env_flag(name: &str) -> bool {
    env_string(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Ensure the parent directory of `path` exists.
pub async fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_truthy_values() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v} should be truthy");
        }
        for v in ["0", "false", "off", "", "maybe"] {
            assert!(!parse_flag(v), "{v} should be falsy");
        }
    }

    #[test]
    fn env_string_ignores_blank_values() {
        let name = format!("MECANIX_TEST_BLANK_{}", uuid::Uuid::new_v4().simple());
        std::env::set_var(&name, "   ");
        assert_eq!(env_string(&name), None);
        std::env::set_var(&name, " http://x ");
        assert_eq!(env_string(&name).as_deref(), Some("http://x"));
        std::env::remove_var(&name);
    }

    #[tokio::test]
    async fn ensure_parent_dir_creates_nested_directories() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("mecanix_env_{}", uuid::Uuid::new_v4()));
        let file = root.join("a/b/session.json");
        ensure_parent_dir(&file).await?;
        assert!(tokio::fs::metadata(root.join("a/b")).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn ensure_parent_dir_accepts_bare_file_names() -> anyhow::Result<()> {
        ensure_parent_dir(Path::new("session.json")).await?;
        Ok(())
    }
}
