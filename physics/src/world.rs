use hillfox_core::{CollisionHeights, GroundQuery, HeightfieldDescriptor};
use rapier3d::na::DMatrix;
use rapier3d::parry::query::RayCast;
use rapier3d::prelude::*;

pub const TERRAIN_FRICTION: Real = 1.0;
pub const TERRAIN_RESTITUTION: Real = 0.2;

// Grounded probe: starts this far above the feet...
pub const GROUND_PROBE_LIFT: Real = 0.5;
// ...and reaches this far down
pub const GROUND_PROBE_REACH: Real = 1.0;

// Fixed heightfield collider built from the column-major collision copy.
// Rapier reads the matrix with rows along z and columns along x, centred on the
// origin and stretched by `scale`, which is exactly how the render mesh is laid out.
pub fn heightfield_collider(heights: &CollisionHeights) -> Collider {
    let rows = heights.rows as usize + 1;
    let cols = heights.cols as usize + 1;
    let matrix = DMatrix::from_column_slice(rows, cols, &heights.heights);
    let scale = heights.scale;
    ColliderBuilder::heightfield(matrix, vector![scale.x, scale.y, scale.z])
        .friction(TERRAIN_FRICTION)
        .restitution(TERRAIN_RESTITUTION)
        .build()
}

// The slice of a physics world the terrain lives in
pub struct TerrainPhysics {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub island_manager: IslandManager,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    terrain: Option<TerrainBody>,
}

struct TerrainBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    // World-space height range of the collider
    lowest: Real,
    highest: Real,
}

impl TerrainPhysics {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            terrain: None,
        }
    }

    pub fn from_heightfield(heightfield: &HeightfieldDescriptor) -> Self {
        let mut physics = Self::new();
        physics.replace_terrain(&heightfield.collision_heights());
        physics
    }

    // Swap in a new terrain collider, dropping the previous one.
    // Returns the handle of the new collider.
    pub fn replace_terrain(&mut self, heights: &CollisionHeights) -> ColliderHandle {
        if let Some(old) = self.terrain.take() {
            self.rigid_body_set.remove(
                old.body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            log::debug!("removed previous terrain collider");
        }

        let body = self.rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        let collider = self.collider_set.insert_with_parent(
            heightfield_collider(heights),
            body,
            &mut self.rigid_body_set,
        );

        let (lo, hi) = heights
            .heights
            .iter()
            .fold((Real::MAX, Real::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        self.terrain = Some(TerrainBody {
            body,
            collider,
            lowest: lo * heights.scale.y,
            highest: hi * heights.scale.y,
        });

        log::info!(
            "terrain collider installed: {}x{} cells, friction {}, restitution {}",
            heights.cols,
            heights.rows,
            TERRAIN_FRICTION,
            TERRAIN_RESTITUTION
        );
        collider
    }

    pub fn terrain_collider(&self) -> Option<ColliderHandle> {
        self.terrain.as_ref().map(|t| t.collider)
    }

    // Distance along a straight-down ray from `origin` to the terrain surface
    pub fn cast_down(&self, origin: [Real; 3], max_distance: Real) -> Option<Real> {
        let terrain = self.terrain.as_ref()?;
        let collider = self.collider_set.get(terrain.collider)?;
        let ray = Ray::new(
            point![origin[0], origin[1], origin[2]],
            vector![0.0, -1.0, 0.0],
        );
        collider
            .shape()
            .cast_ray(collider.position(), &ray, max_distance, true)
    }

    // Surface height under (x, z), or None outside the terrain footprint
    pub fn cast_ground(&self, x: Real, z: Real) -> Option<Real> {
        let terrain = self.terrain.as_ref()?;
        let start = terrain.highest + 1.0;
        let reach = terrain.highest - terrain.lowest + 2.0;
        self.cast_down([x, start, z], reach)
            .map(|distance| start - distance)
    }

    // Something solid within reach below `position`
    pub fn is_grounded(&self, position: [Real; 3]) -> bool {
        let [x, y, z] = position;
        self.cast_down([x, y + GROUND_PROBE_LIFT, z], GROUND_PROBE_REACH)
            .is_some()
    }
}

impl Default for TerrainPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundQuery for TerrainPhysics {
    // 0.0 off the terrain or before one is installed
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        self.cast_ground(x, z).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hillfox_core::Scale;
    use rapier3d::parry::shape::ShapeType;

    fn ramp_x() -> HeightfieldDescriptor {
        // Height rises along x only
        let side = 5;
        let heights = (0..side * side).map(|i| (i % side) as f32 / 4.0).collect();
        HeightfieldDescriptor::from_parts(4, Scale::new(8.0, 2.0, 8.0), heights).unwrap()
    }

    #[test]
    fn empty_world_has_no_ground() {
        let physics = TerrainPhysics::new();
        assert!(physics.terrain_collider().is_none());
        assert_eq!(physics.cast_ground(0.0, 0.0), None);
        assert!(!physics.is_grounded([0.0, 0.0, 0.0]));
        assert_eq!(physics.ground_height(1.0, 1.0), 0.0);
    }

    #[test]
    fn collider_material() {
        let physics = TerrainPhysics::from_heightfield(&ramp_x());
        let handle = physics.terrain_collider().unwrap();
        let collider = physics.collider_set.get(handle).unwrap();
        assert_eq!(collider.friction(), 1.0);
        assert_eq!(collider.restitution(), 0.2);
        assert_eq!(collider.shape().shape_type(), ShapeType::HeightField);
    }

    #[test]
    fn ramp_rises_along_x_not_z() {
        let physics = TerrainPhysics::from_heightfield(&ramp_x());
        let west = physics.cast_ground(-3.0, 0.3).unwrap();
        let east = physics.cast_ground(3.0, 0.3).unwrap();
        assert!((west - 0.25).abs() < 1e-4, "{west}");
        assert!((east - 1.75).abs() < 1e-4, "{east}");

        let north = physics.cast_ground(1.0, -3.0).unwrap();
        let south = physics.cast_ground(1.0, 3.0).unwrap();
        assert!((north - south).abs() < 1e-4);
    }

    #[test]
    fn outside_footprint_misses() {
        let physics = TerrainPhysics::from_heightfield(&ramp_x());
        assert_eq!(physics.cast_ground(20.0, 0.0), None);
        assert_eq!(physics.ground_height(20.0, 0.0), 0.0);
    }

    #[test]
    fn grounded_probe_reach() {
        let physics = TerrainPhysics::from_heightfield(&ramp_x());
        // Ground at x = 0.02 is 1.005
        assert!(physics.is_grounded([0.02, 1.0, 0.3]));
        assert!(physics.is_grounded([0.02, 1.4, 0.3]));
        assert!(!physics.is_grounded([0.02, 1.7, 0.3]));
    }

    #[test]
    fn replace_drops_previous_collider() {
        let mut physics = TerrainPhysics::from_heightfield(&ramp_x());
        let first = physics.terrain_collider().unwrap();

        let flat = HeightfieldDescriptor::from_parts(2, Scale::new(8.0, 2.0, 8.0), vec![0.0; 9])
            .unwrap();
        let second = physics.replace_terrain(&flat.collision_heights());

        assert_ne!(first, second);
        assert!(physics.collider_set.get(first).is_none());
        assert_eq!(physics.collider_set.len(), 1);
        assert_eq!(physics.rigid_body_set.len(), 1);
        assert!(physics.cast_ground(3.0, 0.3).unwrap().abs() < 1e-4);
    }
}
