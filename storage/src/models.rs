use bson::spec::BinarySubtype;
use bson::{Binary, DateTime};
use hillfox_core::{HeightfieldDescriptor, Scale};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

// Bumped whenever PersistedTerrain changes shape
pub const FORMAT_VERSION: u32 = 1;

// Everything needed to rebuild a heightfield without re-running the noise.
// Serialized to BSON bytes; storage backends treat the bytes as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTerrain {
    pub version: u32,
    pub subdivisions: u32,
    pub scale: Scale,
    // Row-major: index = iz * (subdivisions + 1) + ix
    pub heights: Vec<f32>,
}

impl PersistedTerrain {
    pub fn from_heightfield(heightfield: &HeightfieldDescriptor) -> Self {
        Self {
            version: FORMAT_VERSION,
            subdivisions: heightfield.subdivisions(),
            scale: heightfield.scale(),
            heights: heightfield.heights().to_vec(),
        }
    }

    pub fn into_heightfield(self) -> Result<HeightfieldDescriptor> {
        if self.version != FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(HeightfieldDescriptor::from_parts(
            self.subdivisions,
            self.scale,
            self.heights,
        )?)
    }
}

// Just the version, read before committing to the full layout
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

pub fn encode(heightfield: &HeightfieldDescriptor) -> Result<Vec<u8>> {
    Ok(bson::to_vec(&PersistedTerrain::from_heightfield(heightfield))?)
}

pub fn decode(blob: &[u8]) -> Result<HeightfieldDescriptor> {
    let probe: VersionProbe = bson::from_slice(blob)?;
    if probe.version != FORMAT_VERSION {
        return Err(StorageError::VersionMismatch {
            found: probe.version,
            expected: FORMAT_VERSION,
        });
    }
    let persisted: PersistedTerrain = bson::from_slice(blob)?;
    persisted.into_heightfield()
}

// One document per key in the terrain collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainRecord {
    #[serde(rename = "_id")]
    pub key: String,
    pub blob: Binary,
    pub saved_at: DateTime,
}

impl TerrainRecord {
    pub fn new(key: &str, blob: Vec<u8>) -> Self {
        Self {
            key: key.to_string(),
            blob: Binary {
                subtype: BinarySubtype::Generic,
                bytes: blob,
            },
            saved_at: DateTime::now(),
        }
    }
}
