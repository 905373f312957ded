use std::sync::{Arc, PoisonError, RwLock};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::SceneConfig;
use crate::error::{Result, TerrainError};
use crate::heightfield::{CollisionHeights, HeightfieldDescriptor};
use crate::mesh::TerrainMesh;
use crate::noise::SineOctaves;
use crate::sampler::GroundQuery;
use crate::vegetation::{GrassBuffer, GrassConfig, generate_grass};

// Everything derived from one heightfield. Consumers always see the mesh, grass
// and collision data of the same generation because they share this bundle.
#[derive(Debug)]
pub struct TerrainGeneration {
    pub heightfield: Arc<HeightfieldDescriptor>,
    pub mesh: TerrainMesh,
    pub grass: GrassBuffer,
    pub seed: u64,
}

impl TerrainGeneration {
    pub fn build(config: &SceneConfig) -> Result<Self> {
        config.validate()?;
        let heightfield = HeightfieldDescriptor::generate(
            config.terrain.subdivisions,
            config.terrain.scale,
            &SineOctaves::default(),
        )?;
        Ok(Self::from_heightfield(heightfield, &config.grass, config.seed))
    }

    // Mesh and grass for an existing heightfield (e.g. one loaded from storage)
    pub fn from_heightfield(heightfield: HeightfieldDescriptor, grass: &GrassConfig, seed: u64) -> Self {
        let scale = heightfield.scale();
        if grass.plane_size > scale.x.min(scale.z) {
            log::warn!(
                "grass plane ({}) is larger than the terrain ({} x {}); edge blades sit on clamped heights",
                grass.plane_size,
                scale.x,
                scale.z
            );
        }

        let mesh = TerrainMesh::from_heightfield(&heightfield);
        let mut rng = StdRng::seed_from_u64(seed);
        let grass = generate_grass(&heightfield, grass, &mut rng);

        log::info!(
            "terrain generation ready: {} vertices, {} triangles, {} grass blades",
            mesh.positions.len(),
            mesh.triangle_count(),
            grass.blade_count()
        );

        Self {
            heightfield: Arc::new(heightfield),
            mesh,
            grass,
            seed,
        }
    }

    pub fn collision_heights(&self) -> CollisionHeights {
        self.heightfield.collision_heights()
    }
}

impl GroundQuery for TerrainGeneration {
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        self.heightfield.sample_height(x, z)
    }
}

// Shared handle to the generation currently in use.
// Regenerating builds a complete new bundle first and then swaps it in, so a
// reader never mixes data from two generations.
#[derive(Debug, Default)]
pub struct TerrainScene {
    current: RwLock<Option<Arc<TerrainGeneration>>>,
}

impl TerrainScene {
    pub fn new() -> Self {
        Self::default()
    }

    // Publish `generation`, returning the one it replaces
    pub fn install(&self, generation: TerrainGeneration) -> Option<Arc<TerrainGeneration>> {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(Arc::new(generation))
    }

    pub fn current(&self) -> Result<Arc<TerrainGeneration>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TerrainError::NotReady("no terrain generation installed"))
    }

    pub fn is_ready(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl GroundQuery for TerrainScene {
    // 0.0 until the first generation is installed
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        match self.current() {
            Ok(generation) => generation.ground_height(x, z),
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::heightfield::Scale;

    fn config(seed: u64) -> SceneConfig {
        SceneConfig {
            seed,
            terrain: TerrainConfig {
                subdivisions: 12,
                scale: Scale::new(20.0, 1.5, 20.0),
            },
            grass: GrassConfig {
                plane_size: 20.0,
                blade_count: 400,
                ..GrassConfig::default()
            },
            ..SceneConfig::default()
        }
    }

    #[test]
    fn build_produces_consistent_bundle() {
        let generation = TerrainGeneration::build(&config(1)).unwrap();
        assert_eq!(generation.heightfield.subdivisions(), 12);
        assert_eq!(generation.mesh.positions.len(), 13 * 13);
        assert!(generation.grass.blade_count() > 0);
        assert_eq!(generation.collision_heights().heights.len(), 13 * 13);
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut bad = config(1);
        bad.terrain.scale.y = 0.0;
        assert!(matches!(
            TerrainGeneration::build(&bad),
            Err(TerrainError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn rebuild_from_heightfield_matches() {
        let built = TerrainGeneration::build(&config(5)).unwrap();
        let again = TerrainGeneration::from_heightfield(
            (*built.heightfield).clone(),
            &config(5).grass,
            5,
        );
        assert_eq!(built.mesh, again.mesh);
        assert_eq!(built.grass, again.grass);
    }

    #[test]
    fn scene_not_ready_until_installed() {
        let scene = TerrainScene::new();
        assert!(!scene.is_ready());
        assert!(matches!(scene.current(), Err(TerrainError::NotReady(_))));
        assert_eq!(scene.ground_height(1.0, 1.0), 0.0);

        let generation = TerrainGeneration::build(&config(2)).unwrap();
        let expected = generation.ground_height(1.0, 1.0);
        assert!(scene.install(generation).is_none());
        assert!(scene.is_ready());
        assert_eq!(scene.ground_height(1.0, 1.0), expected);
    }

    #[test]
    fn install_swaps_whole_generation() {
        let scene = TerrainScene::new();
        scene.install(TerrainGeneration::build(&config(2)).unwrap());
        let held = scene.current().unwrap();

        let previous = scene.install(TerrainGeneration::build(&config(3)).unwrap()).unwrap();
        assert!(Arc::ptr_eq(&held, &previous));

        // Old readers keep a complete old generation
        assert_eq!(held.seed, 2);
        assert_eq!(scene.current().unwrap().seed, 3);
        assert_ne!(held.grass, scene.current().unwrap().grass);
    }
}
