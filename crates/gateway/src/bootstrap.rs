use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auth::{AuthContext, FileTokenStore};
use crate::client::ApiClient;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::session::SessionEvent;

/// Build the shell's client: file-backed token store plus the standard pipeline.
pub async fn connect(config: GatewayConfig) -> Result<ApiClient, GatewayError> {
    let store = FileTokenStore::open(&config.token_store_path)
        .await
        .map_err(|e| GatewayError::Request(e.to_string()))?;
    let auth = AuthContext::new(Arc::new(store));
    info!(
        base_url = %config.base_url,
        timeout_secs = config.timeout.request_timeout_secs,
        retry_attempts = config.retry.max_attempts,
        retry_delay_ms = config.retry.delay_ms,
        dev_logging = config.dev_logging,
        "gateway client configured"
    );
    ApiClient::builder(config, auth).build()
}

/// Follow session events and hand each navigation target to `navigate`.
///
/// Ends when every sender is gone.
pub fn spawn_session_listener<F>(client: &ApiClient, navigate: F) -> JoinHandle<()>
where
    F: Fn(&'static str) + Send + 'static,
{
    let mut rx = client.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    match &event {
                        SessionEvent::Expired { url } => warn!(%url, "session expired"),
                        SessionEvent::LoggedIn => info!("session started"),
                        SessionEvent::LoggedOut => info!("session ended"),
                    }
                    if let Some(target) = event.redirect_target() {
                        navigate(target);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session listener lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn connect_opens_token_file() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("mecanix_boot_{}/session.json", uuid::Uuid::new_v4()));
        let mut config = GatewayConfig::default().with_base_url("http://127.0.0.1:9");
        config.token_store_path = path.to_string_lossy().into_owned();

        let client = connect(config).await?;
        client.auth().set_token("from-login").await?;
        assert!(tokio::fs::read_to_string(&path).await?.contains("from-login"));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn listener_forwards_redirects() -> Result<(), anyhow::Error> {
        let client = ApiClient::builder(GatewayConfig::default(), AuthContext::in_memory()).build()?;
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = spawn_session_listener(&client, move |target| sink.lock().unwrap().push(target));

        client.events().emit(SessionEvent::LoggedIn);
        client.events().emit(SessionEvent::Expired { url: "http://x/client".into() });
        drop(client);
        handle.await?;

        assert_eq!(*seen.lock().unwrap(), vec![crate::session::LOGIN_ROUTE]);
        Ok(())
    }
}
