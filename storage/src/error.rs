use hillfox_core::TerrainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("failed to encode terrain: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("failed to decode terrain: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("stored terrain has format version {found}, this build reads {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("stored terrain is inconsistent: {0}")]
    InvalidTerrain(#[from] TerrainError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
