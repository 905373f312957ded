// core holds the terrain pipeline: noise, heightfield, mesh, height sampling,
// grass scattering and wind
pub mod config;
pub mod error;
pub mod heightfield;
pub mod mesh;
pub mod noise;
pub mod preview;
pub mod sampler;
pub mod scene;
pub mod vegetation;
pub mod wind;

pub use config::{SceneConfig, TerrainConfig};
pub use error::{Result, TerrainError};
pub use heightfield::{CollisionHeights, GridOrder, HeightfieldDescriptor, Scale};
pub use mesh::TerrainMesh;
pub use noise::SineOctaves;
pub use sampler::{GroundQuery, sample_height};
pub use scene::{TerrainGeneration, TerrainScene};
pub use vegetation::{GrassBuffer, GrassConfig, generate_grass};
pub use wind::{WindClock, WindSway};

// 2D noise source sampled over the unit square
pub trait NoiseGenerator {
    fn get2(&self, x: f64, y: f64) -> f64;
}

// Heightfield and render mesh with the default noise field
pub fn generate_terrain(subdivisions: u32, scale: Scale) -> Result<(HeightfieldDescriptor, TerrainMesh)> {
    let heightfield = HeightfieldDescriptor::generate(subdivisions, scale, &SineOctaves::default())?;
    let mesh = TerrainMesh::from_heightfield(&heightfield);
    Ok((heightfield, mesh))
}
