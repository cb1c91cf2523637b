//! rest facets over a single api collection.

use crate::client::RestClient;
use crate::error::RestError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// payload exchanged with a rest facet.
pub trait InstanaDataObject: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// reject payloads the server should never return.
    fn validate(&self) -> Result<(), String> {
        if self.id().is_empty() {
            return Err("id is missing".to_string());
        }
        Ok(())
    }
}

#[async_trait]
pub trait ReadOnlyRestResource<T: InstanaDataObject>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<T>, RestError>;
    async fn get_one(&self, id: &str) -> Result<T, RestError>;
}

#[async_trait]
pub trait RestResource<T: InstanaDataObject>: ReadOnlyRestResource<T> {
    /// create the object; the returned payload carries the server id.
    async fn create(&self, object: &T) -> Result<T, RestError>;
    /// update an existing object, keeping its id.
    async fn update(&self, object: &T) -> Result<T, RestError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), RestError>;

    async fn delete(&self, object: &T) -> Result<(), RestError> {
        self.delete_by_id(object.id()).await
    }
}

/// how a collection accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// POST to the collection on create, PUT to `/{id}` on update.
    PostCollectionPutId,
    /// POST to the collection on create, POST to `/{id}` on update.
    PostCollectionPostId,
    /// PUT to `/{id}` for both; a fresh uuid is minted when the object has none.
    PutGeneratedId,
}

fn ensure_valid<T: InstanaDataObject>(object: T) -> Result<T, RestError> {
    object.validate().map_err(RestError::InvalidObject)?;
    Ok(object)
}

/// read only facet over `path`.
pub struct ReadOnlyResource<T> {
    client: Arc<RestClient>,
    path: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ReadOnlyResource<T> {
    pub fn new(client: Arc<RestClient>, path: &'static str) -> Self {
        Self {
            client,
            path,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: InstanaDataObject> ReadOnlyRestResource<T> for ReadOnlyResource<T> {
    async fn get_all(&self) -> Result<Vec<T>, RestError> {
        let objects: Vec<T> = self.client.get(self.path).await?;
        objects.into_iter().map(ensure_valid).collect()
    }

    async fn get_one(&self, id: &str) -> Result<T, RestError> {
        let object: T = self.client.get(&format!("{}/{}", self.path, id)).await?;
        ensure_valid(object)
    }
}

/// read-write facet over `path` using the given upsert mode.
pub struct DefaultRestResource<T> {
    reader: ReadOnlyResource<T>,
    mode: UpsertMode,
}

impl<T> DefaultRestResource<T> {
    pub fn new(client: Arc<RestClient>, path: &'static str, mode: UpsertMode) -> Self {
        Self {
            reader: ReadOnlyResource::new(client, path),
            mode,
        }
    }

    pub fn mode(&self) -> UpsertMode {
        self.mode
    }

    fn client(&self) -> &RestClient {
        &self.reader.client
    }

    fn path(&self) -> &'static str {
        self.reader.path
    }
}

#[async_trait]
impl<T: InstanaDataObject> ReadOnlyRestResource<T> for DefaultRestResource<T> {
    async fn get_all(&self) -> Result<Vec<T>, RestError> {
        self.reader.get_all().await
    }

    async fn get_one(&self, id: &str) -> Result<T, RestError> {
        self.reader.get_one(id).await
    }
}

#[async_trait]
impl<T: InstanaDataObject> RestResource<T> for DefaultRestResource<T> {
    async fn create(&self, object: &T) -> Result<T, RestError> {
        let created: T = match self.mode {
            UpsertMode::PostCollectionPutId | UpsertMode::PostCollectionPostId => {
                self.client().post(self.path(), object).await?
            }
            UpsertMode::PutGeneratedId => {
                let mut object = object.clone();
                if object.id().is_empty() {
                    object.set_id(uuid::Uuid::new_v4().to_string());
                }
                let path = format!("{}/{}", self.path(), object.id());
                self.client().put(&path, &object).await?
            }
        };
        ensure_valid(created)
    }

    async fn update(&self, object: &T) -> Result<T, RestError> {
        if object.id().is_empty() {
            return Err(RestError::InvalidObject(
                "cannot update an object without id".to_string(),
            ));
        }
        let path = format!("{}/{}", self.path(), object.id());
        let updated: T = match self.mode {
            UpsertMode::PostCollectionPostId => self.client().post(&path, object).await?,
            UpsertMode::PostCollectionPutId | UpsertMode::PutGeneratedId => {
                self.client().put(&path, object).await?
            }
        };
        ensure_valid(updated)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), RestError> {
        self.client()
            .delete(&format!("{}/{}", self.path(), id))
            .await
    }
}
