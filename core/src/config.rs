use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::heightfield::Scale;
use crate::vegetation::GrassConfig;
use crate::wind::WindSway;

pub const DEFAULT_SEED: u64 = 2025;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub subdivisions: u32,
    pub scale: Scale,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            subdivisions: 40,
            scale: Scale::default(),
        }
    }
}

// Everything needed to rebuild a scene, usually read from a TOML file:
//
//   seed = 7
//   [terrain]
//   subdivisions = 64
//   scale = { x = 100.0, y = 1.5, z = 100.0 }
//   [grass]
//   blade_count = 250000
//
// Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    // Seeds the grass scatter; the terrain itself does not depend on it
    pub seed: u64,
    pub terrain: TerrainConfig,
    pub grass: GrassConfig,
    pub wind: WindSway,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            terrain: TerrainConfig::default(),
            grass: GrassConfig::default(),
            wind: WindSway::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading scene config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.terrain.subdivisions < 1 {
            return Err(TerrainError::dimension(
                "terrain.subdivisions",
                ">= 1",
                self.terrain.subdivisions as f64,
            ));
        }
        self.terrain.scale.validate()?;
        self.grass.validate()
    }
}
