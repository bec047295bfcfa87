use crate::DirectoryStore;
use async_trait::async_trait;
use rdf_dal_common::config::ResourcePoolConfig;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::SparqlStore;
use rdf_dal_pool::keyed::{HandleFactory, PoolKey};
use tracing::debug;

/// Creates one [DirectoryStore] per key, located at [PoolKey::location].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryStoreFactory {
    required: bool,
}

impl DirectoryStoreFactory {
    /// Creates a new [DirectoryStoreFactory].
    ///
    /// If `required` is set, the directory of a key must already exist. Otherwise, missing
    /// directories are created.
    pub fn new(required: bool) -> Self {
        Self { required }
    }

    pub fn from_config(config: &ResourcePoolConfig) -> Self {
        Self::new(config.required)
    }
}

#[async_trait]
impl HandleFactory for DirectoryStoreFactory {
    type Handle = DirectoryStore;
    type Error = StorageError;

    async fn create(&self, key: &PoolKey) -> Result<DirectoryStore, StorageError> {
        DirectoryStore::open(key.location(), !self.required)
    }

    async fn validate(&self, _key: &PoolKey, store: &DirectoryStore) -> bool {
        !store.is_closed() && store.location().is_dir()
    }

    fn passivate(&self, key: &PoolKey, _store: &DirectoryStore) {
        debug!(key = %key, "Directory store returned to the pool");
    }

    async fn destroy(&self, _key: &PoolKey, store: &DirectoryStore) -> Result<(), StorageError> {
        store.close().await
    }
}
