use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::sampler::GroundQuery;

pub const VERTICES_PER_BLADE: usize = 5;
pub const INDICES_PER_BLADE: usize = 9;

// Local triangle pattern of one blade: base quad half, mid-to-tip, closing triangle
pub const BLADE_INDICES: [u32; INDICES_PER_BLADE] = [0, 1, 2, 2, 4, 3, 3, 0, 2];

// Mid corners are this fraction of the base width
const MID_WIDTH_RATIO: f32 = 0.5;

// Largest allowed jitter as a fraction of one lattice cell
pub const MAX_JITTER: f32 = 0.8;

// Vertical zone of a blade vertex, drives wind sway strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BladeRole {
    Base,
    Mid,
    Tip,
}

impl BladeRole {
    pub const fn weight(self) -> f32 {
        match self {
            BladeRole::Base => 0.0,
            BladeRole::Mid => 0.5,
            BladeRole::Tip => 1.0,
        }
    }
}

// Role of each of the five blade vertices, in emission order
pub const BLADE_ROLES: [BladeRole; VERTICES_PER_BLADE] = [
    BladeRole::Base,
    BladeRole::Base,
    BladeRole::Mid,
    BladeRole::Mid,
    BladeRole::Tip,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    // Side of the square area covered by grass, centred on the origin
    pub plane_size: f32,
    // Requested blade count; the lattice is floor(sqrt(blade_count)) per side
    pub blade_count: u32,
    pub blade_width: f32,
    pub blade_height: f32,
    // Extra random height in [0, height_variation)
    pub height_variation: f32,
    // Horizontal lean of the tip along the bend direction
    pub tip_offset: f32,
    // Random offset as a fraction of a lattice cell, at most MAX_JITTER
    pub jitter: f32,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            plane_size: 100.0,
            blade_count: 1_000_000,
            blade_width: 0.1,
            blade_height: 0.17,
            height_variation: 0.15,
            tip_offset: 0.1,
            jitter: MAX_JITTER,
        }
    }
}

impl GrassConfig {
    pub fn grid_size(&self) -> u32 {
        (self.blade_count as f64).sqrt().floor() as u32
    }

    pub fn lattice_cells(&self) -> usize {
        let g = self.grid_size() as usize;
        g * g
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("grass.plane_size", self.plane_size),
            ("grass.blade_width", self.blade_width),
            ("grass.blade_height", self.blade_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TerrainError::dimension(field, "> 0", value as f64));
            }
        }
        let non_negative = [
            ("grass.height_variation", self.height_variation),
            ("grass.tip_offset", self.tip_offset),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TerrainError::dimension(field, ">= 0", value as f64));
            }
        }
        if !(0.0..=MAX_JITTER).contains(&self.jitter) {
            return Err(TerrainError::dimension(
                "grass.jitter",
                "within [0, 0.8]",
                self.jitter as f64,
            ));
        }
        Ok(())
    }
}

// One grass blade before it is folded into the merged buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blade {
    // Base centre, y snapped to the ground
    pub center: Vec3,
    pub height: f32,
    pub yaw: f32,
    pub tip_bend: f32,
}

impl Blade {
    // Random height, then a yaw biased towards the blade's polar angle around the
    // origin, then a tip bend relative to that yaw
    pub fn sample<R: Rng + ?Sized>(center: Vec3, config: &GrassConfig, rng: &mut R) -> Self {
        let height = config.blade_height + rng.random::<f32>() * config.height_variation;
        let rotation_bias = center.z.atan2(center.x);
        let yaw = rotation_bias + (rng.random::<f32>() - 0.5) * PI * 0.5;
        let tip_bend = yaw + (rng.random::<f32>() - 0.5) * PI * 0.25;
        Self {
            center,
            height,
            yaw,
            tip_bend,
        }
    }

    // base-left, base-right, mid-right, mid-left, tip
    pub fn vertices(&self, config: &GrassConfig) -> [Vec3; VERTICES_PER_BLADE] {
        let yaw_axis = Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos());
        let bend_axis = Vec3::new(self.tip_bend.sin(), 0.0, -self.tip_bend.cos());

        let half_base = config.blade_width * 0.5;
        let half_mid = config.blade_width * MID_WIDTH_RATIO * 0.5;
        let mid_lift = Vec3::Y * (self.height * 0.5);

        let c = self.center;
        [
            c + yaw_axis * half_base,
            c - yaw_axis * half_base,
            c - yaw_axis * half_mid + mid_lift,
            c + yaw_axis * half_mid + mid_lift,
            c + bend_axis * config.tip_offset + Vec3::Y * self.height,
        ]
    }
}

// Every blade merged into one draw-call-ready mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrassBuffer {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    // BladeRole weight per vertex
    pub roles: Vec<f32>,
    pub indices: Vec<u32>,
    // Lattice cells visited and how many of them jittered off the plane
    pub lattice_cells: usize,
    pub discarded: usize,
}

impl GrassBuffer {
    fn with_capacity(blades: usize) -> Self {
        Self {
            positions: Vec::with_capacity(blades * VERTICES_PER_BLADE),
            uvs: Vec::with_capacity(blades * VERTICES_PER_BLADE),
            roles: Vec::with_capacity(blades * VERTICES_PER_BLADE),
            indices: Vec::with_capacity(blades * INDICES_PER_BLADE),
            lattice_cells: blades,
            discarded: 0,
        }
    }

    fn push_blade(&mut self, blade: &Blade, config: &GrassConfig, uv: [f32; 2]) {
        let offset = self.positions.len() as u32;
        for (vertex, role) in blade.vertices(config).iter().zip(BLADE_ROLES) {
            self.positions.push(vertex.to_array());
            self.uvs.push(uv);
            self.roles.push(role.weight());
        }
        self.indices.extend(BLADE_INDICES.iter().map(|&i| offset + i));
    }

    pub fn blade_count(&self) -> usize {
        self.positions.len() / VERTICES_PER_BLADE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // Role replicated into r, g and b for vertex-colour shaders
    pub fn colors(&self) -> Vec<[f32; 3]> {
        self.roles.iter().map(|&r| [r, r, r]).collect()
    }

    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn flat_uvs(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }
}

// Scatter blades over a jittered square lattice and snap them to `ground`.
// Meant to run once per terrain generation: cost and memory are linear in the
// lattice size (5 vertices and 9 indices per blade).
pub fn generate_grass<G, R>(ground: &G, config: &GrassConfig, rng: &mut R) -> GrassBuffer
where
    G: GroundQuery + ?Sized,
    R: Rng + ?Sized,
{
    let grid_size = config.grid_size();
    let mut buffer = GrassBuffer::with_capacity(config.lattice_cells());
    if grid_size == 0 {
        return buffer;
    }

    let cells = grid_size as f32;
    let cell_size = config.plane_size / cells;
    let half_plane = config.plane_size * 0.5;

    for i in 0..grid_size {
        for j in 0..grid_size {
            let base_x = (i as f32 / cells - 0.5) * config.plane_size;
            let base_z = (j as f32 / cells - 0.5) * config.plane_size;

            let x = base_x + (rng.random::<f32>() - 0.5) * cell_size * config.jitter;
            let z = base_z + (rng.random::<f32>() - 0.5) * cell_size * config.jitter;

            // Only the low edge cells can jitter out
            if x.abs() > half_plane || z.abs() > half_plane {
                buffer.discarded += 1;
                continue;
            }

            let center = Vec3::new(x, ground.ground_height(x, z), z);
            let uv = [x / config.plane_size + 0.5, z / config.plane_size + 0.5];
            let blade = Blade::sample(center, config, rng);
            buffer.push_blade(&blade, config, uv);
        }
    }

    log::debug!(
        "generated {} grass blades ({} lattice cells, {} discarded)",
        buffer.blade_count(),
        buffer.lattice_cells,
        buffer.discarded
    );

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::{HeightfieldDescriptor, Scale};
    use crate::noise::SineOctaves;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Flat(f32);

    impl GroundQuery for Flat {
        fn ground_height(&self, _x: f32, _z: f32) -> f32 {
            self.0
        }
    }

    fn small_config(blade_count: u32) -> GrassConfig {
        GrassConfig {
            plane_size: 10.0,
            blade_count,
            ..GrassConfig::default()
        }
    }

    #[test]
    fn grid_size_floors_sqrt() {
        assert_eq!(small_config(1_000_000).grid_size(), 1000);
        assert_eq!(small_config(99).grid_size(), 9);
        assert_eq!(small_config(0).grid_size(), 0);
    }

    #[test]
    fn blade_counts_and_buffer_sizes() {
        let config = small_config(2500);
        let mut rng = StdRng::seed_from_u64(7);
        let grass = generate_grass(&Flat(0.0), &config, &mut rng);

        assert_eq!(grass.lattice_cells, 2500);
        assert!(grass.blade_count() <= 2500);
        assert_eq!(grass.blade_count(), 2500 - grass.discarded);
        assert_eq!(grass.positions.len(), grass.blade_count() * 5);
        assert_eq!(grass.uvs.len(), grass.positions.len());
        assert_eq!(grass.roles.len(), grass.positions.len());
        assert_eq!(grass.indices.len(), grass.blade_count() * 9);
        assert_eq!(grass.triangle_count() * 3, grass.indices.len());
    }

    #[test]
    fn indices_stay_in_range() {
        let config = small_config(400);
        let mut rng = StdRng::seed_from_u64(11);
        let grass = generate_grass(&Flat(1.0), &config, &mut rng);
        let vertex_count = grass.flat_positions().len() / 3;
        assert!(grass.indices.iter().all(|&i| (i as usize) < vertex_count));
        // Blade k uses vertices 5k..5k+5 only
        for (k, blade) in grass.indices.chunks_exact(9).enumerate() {
            let first = (k * 5) as u32;
            assert!(blade.iter().all(|&i| i >= first && i < first + 5));
        }
    }

    #[test]
    fn same_seed_same_grass() {
        let config = small_config(900);
        let a = generate_grass(&Flat(0.0), &config, &mut StdRng::seed_from_u64(3));
        let b = generate_grass(&Flat(0.0), &config, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
        let c = generate_grass(&Flat(0.0), &config, &mut StdRng::seed_from_u64(4));
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn no_jitter_keeps_every_cell() {
        let config = GrassConfig {
            jitter: 0.0,
            ..small_config(100)
        };
        let grass = generate_grass(&Flat(0.0), &config, &mut StdRng::seed_from_u64(1));
        assert_eq!(grass.discarded, 0);
        assert_eq!(grass.blade_count(), 100);
    }

    #[test]
    fn blades_stay_on_plane() {
        let config = small_config(1600);
        let grass = generate_grass(&Flat(0.0), &config, &mut StdRng::seed_from_u64(5));
        for p in grass.positions.iter().step_by(5) {
            // base-left sits half a blade width from the centre at most
            assert!(p[0].abs() <= 5.0 + 0.05 + 1e-6);
            assert!(p[2].abs() <= 5.0 + 0.05 + 1e-6);
        }
        for uv in &grass.uvs {
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn blades_snap_to_ground() {
        let config = small_config(400);
        let grass = generate_grass(&Flat(2.0), &config, &mut StdRng::seed_from_u64(9));
        for blade in grass.positions.chunks_exact(5) {
            assert_eq!(blade[0][1], 2.0);
            assert_eq!(blade[1][1], 2.0);
            let tip = blade[4][1] - 2.0;
            assert!(tip >= 0.17 - 1e-6 && tip < 0.32 + 1e-6, "tip height {tip}");
            assert!((blade[2][1] - 2.0 - tip * 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn blades_follow_heightfield() {
        let hf = HeightfieldDescriptor::generate(
            16,
            Scale::new(10.0, 1.5, 10.0),
            &SineOctaves::default(),
        )
        .unwrap();
        let config = small_config(900);
        let grass = generate_grass(&hf, &config, &mut StdRng::seed_from_u64(21));
        for blade in grass.positions.chunks_exact(5) {
            // base corners sit on the sampled height of the blade centre
            let cx = (blade[0][0] + blade[1][0]) * 0.5;
            let cz = (blade[0][2] + blade[1][2]) * 0.5;
            assert!((blade[0][1] - hf.sample_height(cx, cz)).abs() < 1e-4);
        }
    }

    #[test]
    fn role_pattern() {
        let grass = generate_grass(&Flat(0.0), &small_config(16), &mut StdRng::seed_from_u64(2));
        for roles in grass.roles.chunks_exact(5) {
            assert_eq!(roles, &[0.0, 0.0, 0.5, 0.5, 1.0]);
        }
        assert_eq!(grass.colors()[4], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn blade_geometry() {
        let config = GrassConfig::default();
        let blade = Blade {
            center: Vec3::new(1.0, 2.0, 3.0),
            height: 0.2,
            yaw: 0.0,
            tip_bend: PI * 0.5,
        };
        let v = blade.vertices(&config);
        let close = |a: Vec3, b: Vec3| (a - b).length() < 1e-6;
        assert!(close(v[0], Vec3::new(1.0, 2.0, 2.95)));
        assert!(close(v[1], Vec3::new(1.0, 2.0, 3.05)));
        assert!(close(v[2], Vec3::new(1.0, 2.1, 3.025)));
        assert!(close(v[3], Vec3::new(1.0, 2.1, 2.975)));
        assert!(close(v[4], Vec3::new(1.1, 2.2, 3.0)));
    }

    #[test]
    fn yaw_biased_towards_polar_angle() {
        let config = GrassConfig::default();
        let mut rng = StdRng::seed_from_u64(13);
        let center = Vec3::new(0.0, 0.0, 4.0);
        for _ in 0..200 {
            let blade = Blade::sample(center, &config, &mut rng);
            let bias = PI * 0.5;
            assert!((blade.yaw - bias).abs() <= PI * 0.25 + 1e-6);
            assert!((blade.tip_bend - blade.yaw).abs() <= PI * 0.125 + 1e-6);
            assert!(blade.height >= 0.17 && blade.height < 0.32 + 1e-6);
        }
    }

    #[test]
    fn zero_blades_is_empty() {
        let grass = generate_grass(&Flat(0.0), &small_config(0), &mut StdRng::seed_from_u64(0));
        assert!(grass.is_empty());
        assert_eq!(grass.lattice_cells, 0);
    }

    #[test]
    fn config_validation() {
        assert!(GrassConfig::default().validate().is_ok());
        let bad_jitter = GrassConfig {
            jitter: 0.9,
            ..GrassConfig::default()
        };
        assert!(bad_jitter.validate().is_err());
        let bad_width = GrassConfig {
            blade_width: 0.0,
            ..GrassConfig::default()
        };
        assert!(bad_width.validate().is_err());
    }
}
