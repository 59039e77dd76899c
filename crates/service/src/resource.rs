use std::marker::PhantomData;
use std::sync::Arc;

use gateway::endpoint::{join_path, with_query};
use gateway::pipeline::RequestContext;
use gateway::ApiClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::pagination::ListQuery;

/// A REST resource the backend exposes with list/get/create/update/delete.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    const PATH: &'static str;
    const NAME: &'static str;

    fn id(&self) -> Option<i64>;

    /// Checked before create and update are dispatched.
    fn validate(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// List bodies come either bare or wrapped under `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<R> {
    Plain(Vec<R>),
    Wrapped { data: Vec<R> },
}

impl<R> ListBody<R> {
    fn into_items(self) -> Vec<R> {
        match self {
            ListBody::Plain(items) | ListBody::Wrapped { data: items } => items,
        }
    }
}

/// CRUD calls for one resource path.
pub struct ResourceService<R> {
    client: Arc<ApiClient>,
    path: &'static str,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), path: self.path, _marker: PhantomData }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::at(client, R::PATH)
    }

    /// Same resource served under another path (`/order` for reservations).
    pub fn at(client: Arc<ApiClient>, path: &'static str) -> Self {
        Self { client, path, _marker: PhantomData }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>, ServiceError> {
        let path = with_query(self.path, &query.to_query_string());
        let body: ListBody<R> = self.client.request(RequestContext::get(path)).await?;
        let items = body.into_items();
        debug!(count = items.len(), "listed");
        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<R, ServiceError> {
        let path = join_path(self.path, [id]);
        self.client.get(&path).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::not_found(R::NAME, id)
            } else {
                e.into()
            }
        })
    }

    #[instrument(skip(self, item), fields(resource = R::NAME))]
    pub async fn create(&self, item: &R) -> Result<R, ServiceError> {
        item.validate()?;
        let created: R = self.client.post(self.path, item).await?;
        debug!(id = ?created.id(), "created");
        Ok(created)
    }

    #[instrument(skip(self, item), fields(resource = R::NAME))]
    pub async fn update(&self, id: i64, item: &R) -> Result<R, ServiceError> {
        item.validate()?;
        let path = join_path(self.path, [id]);
        self.client.put(&path, item).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::not_found(R::NAME, id)
            } else {
                e.into()
            }
        })
    }

    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let path = join_path(self.path, [id]);
        let _: Value = self.client.delete(&path).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::not_found(R::NAME, id)
            } else {
                ServiceError::from(e)
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_body_accepts_both_shapes() {
        let plain: ListBody<i64> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(plain.into_items(), vec![1, 2]);
        let wrapped: ListBody<i64> = serde_json::from_value(json!({ "data": [3], "total": 1 })).unwrap();
        assert_eq!(wrapped.into_items(), vec![3]);
    }
}
