//! Client screens' data source: the backend, or built-in sample data.
//!
//! Sample data is only used when `app.use_mock_data` is set; the backend is
//! the default.

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway::ApiClient;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::ServiceError;
use crate::models::Client;
use crate::pagination::ListQuery;
use crate::resource::{Resource, ResourceService};

pub type ClientService = ResourceService<Client>;

pub fn client_service(client: Arc<ApiClient>) -> ClientService {
    ResourceService::new(client)
}

/// In-memory client table seeded with sample rows.
pub struct MockClientStore {
    inner: RwLock<BTreeMap<i64, Client>>,
}

impl MockClientStore {
    pub fn empty() -> Self {
        Self { inner: RwLock::new(BTreeMap::new()) }
    }

    pub fn seeded() -> Self {
        let rows = [
            ("Carlos", "Ramírez", "carlos.ramirez@example.com", "555-0101"),
            ("María", "González", "maria.gonzalez@example.com", "555-0102"),
            ("Jorge", "Herrera", "jorge.herrera@example.com", "555-0103"),
        ];
        let map = rows
            .into_iter()
            .enumerate()
            .map(|(i, (name, last_name, email, phone))| {
                let id = i as i64 + 1;
                let client = Client {
                    id: Some(id),
                    name: name.into(),
                    last_name: last_name.into(),
                    email: email.into(),
                    phone: phone.into(),
                    address: None,
                };
                (id, client)
            })
            .collect();
        Self { inner: RwLock::new(map) }
    }

    pub async fn list(&self, query: &ListQuery) -> Vec<Client> {
        let query = query.clone().normalize();
        let needle = query.search.as_deref().map(str::to_lowercase);
        let map = self.inner.read().await;
        let matching = map.values().filter(|c| match &needle {
            Some(n) => c.full_name().to_lowercase().contains(n) || c.email.to_lowercase().contains(n),
            None => true,
        });
        match (query.page, query.per_page) {
            (Some(page), Some(per_page)) => matching
                .skip((page as usize - 1).saturating_mul(per_page as usize))
                .take(per_page as usize)
                .cloned()
                .collect(),
            _ => matching.cloned().collect(),
        }
    }

    pub async fn get(&self, id: i64) -> Option<Client> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, mut client: Client) -> Client {
        let mut map = self.inner.write().await;
        let id = map.keys().next_back().copied().unwrap_or(0) + 1;
        client.id = Some(id);
        map.insert(id, client.clone());
        client
    }

    pub async fn replace(&self, id: i64, mut client: Client) -> Option<Client> {
        let mut map = self.inner.write().await;
        let slot = map.get_mut(&id)?;
        client.id = Some(id);
        *slot = client.clone();
        Some(client)
    }

    pub async fn remove(&self, id: i64) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }
}

pub enum ClientSource {
    Remote(ClientService),
    Mock(Arc<MockClientStore>),
}

/// What the client screens call; same contract for both sources.
pub struct ClientDirectory {
    source: ClientSource,
}

impl ClientDirectory {
    pub fn new(source: ClientSource) -> Self {
        Self { source }
    }

    pub fn from_settings(client: Arc<ApiClient>, use_mock_data: bool) -> Self {
        if use_mock_data {
            info!("client screens use built-in sample data");
            Self::new(ClientSource::Mock(Arc::new(MockClientStore::seeded())))
        } else {
            Self::new(ClientSource::Remote(client_service(client)))
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.source, ClientSource::Mock(_))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Client>, ServiceError> {
        match &self.source {
            ClientSource::Remote(svc) => svc.list(query).await,
            ClientSource::Mock(store) => Ok(store.list(query).await),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Client, ServiceError> {
        match &self.source {
            ClientSource::Remote(svc) => svc.get(id).await,
            ClientSource::Mock(store) => store
                .get(id)
                .await
                .ok_or_else(|| ServiceError::not_found(Client::NAME, id)),
        }
    }

    pub async fn create(&self, client: &Client) -> Result<Client, ServiceError> {
        match &self.source {
            ClientSource::Remote(svc) => svc.create(client).await,
            ClientSource::Mock(store) => {
                client.validate()?;
                Ok(store.insert(client.clone()).await)
            }
        }
    }

    pub async fn update(&self, id: i64, client: &Client) -> Result<Client, ServiceError> {
        match &self.source {
            ClientSource::Remote(svc) => svc.update(id, client).await,
            ClientSource::Mock(store) => {
                client.validate()?;
                store
                    .replace(id, client.clone())
                    .await
                    .ok_or_else(|| ServiceError::not_found(Client::NAME, id))
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        match &self.source {
            ClientSource::Remote(svc) => svc.delete(id).await,
            ClientSource::Mock(store) => {
                if store.remove(id).await {
                    Ok(())
                } else {
                    Err(ServiceError::not_found(Client::NAME, id))
                }
            }
        }
    }
}
