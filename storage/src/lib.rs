// storage persists terrain heightfields as versioned blobs, in MongoDB or in memory

pub mod error;
pub mod models;

use std::collections::HashMap;

use bson::doc;
use futures_util::stream::TryStreamExt;
use hillfox_core::HeightfieldDescriptor;
use mongodb::{Client, Collection, options::ClientOptions};
use tokio::sync::RwLock;

pub use crate::error::{Result, StorageError};
pub use crate::models::{FORMAT_VERSION, PersistedTerrain, decode, encode};
use crate::models::TerrainRecord;

// The single slot the current terrain is saved under
pub const TERRAIN_KEY: &str = "terrain";

pub const DEFAULT_DB: &str = "hillfox";
pub const DEFAULT_COLLECTION: &str = "terrain";

// Key → opaque blob
#[allow(async_fn_in_trait)]
pub trait TerrainStore {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub async fn save_terrain<S: TerrainStore + ?Sized>(
    store: &S,
    heightfield: &HeightfieldDescriptor,
) -> Result<()> {
    let blob = encode(heightfield)?;
    log::info!(
        "saving terrain ({} subdivisions, {} bytes) under {:?}",
        heightfield.subdivisions(),
        blob.len(),
        TERRAIN_KEY
    );
    store.put(TERRAIN_KEY, blob).await
}

// None when nothing has been saved yet
pub async fn load_terrain<S: TerrainStore + ?Sized>(store: &S) -> Result<Option<HeightfieldDescriptor>> {
    match store.get(TERRAIN_KEY).await? {
        Some(blob) => {
            let heightfield = decode(&blob)?;
            log::info!(
                "loaded terrain ({} subdivisions) from {:?}",
                heightfield.subdivisions(),
                TERRAIN_KEY
            );
            Ok(Some(heightfield))
        }
        None => {
            log::info!("no stored terrain under {:?}", TERRAIN_KEY);
            Ok(None)
        }
    }
}

pub struct MongoTerrainStore {
    col: Collection<TerrainRecord>,
}

impl MongoTerrainStore {
    // Connect and bind to the terrain collection
    pub async fn init(uri: &str, db_name: &str, col_name: &str) -> Result<Self> {
        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("hillfox".to_string());
        let client = Client::with_options(opts)?;
        let col = client.database(db_name).collection(col_name);
        log::debug!("terrain store bound to {}.{}", db_name, col_name);
        Ok(Self { col })
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let mut cursor = self.col.find(doc! {}).await?;
        let mut keys = Vec::new();
        while let Some(record) = cursor.try_next().await? {
            keys.push(record.key);
        }
        Ok(keys)
    }
}

impl TerrainStore for MongoTerrainStore {
    // Upsert: a key holds at most one blob
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<()> {
        let record = TerrainRecord::new(key, blob);
        self.col
            .replace_one(doc! { "_id": key }, record)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let record = self.col.find_one(doc! { "_id": key }).await?;
        Ok(record.map(|r| r.blob.bytes))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.col.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }
}

// Process-local store for tests and offline runs
#[derive(Debug, Default)]
pub struct MemoryTerrainStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryTerrainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl TerrainStore for MemoryTerrainStore {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<()> {
        self.blobs.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}
