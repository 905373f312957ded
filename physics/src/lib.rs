// physics turns a terrain generation into a rapier heightfield collider and
// answers ground probes against it
pub mod world;

pub use world::{TerrainPhysics, heightfield_collider};
