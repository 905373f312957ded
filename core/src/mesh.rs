use glam::Vec3;

use crate::heightfield::{GridOrder, HeightfieldDescriptor};

// Render-only triangulation of a heightfield.
// Vertices follow GridOrder::RowMajor, so vertex k sits on the same grid point
// as descriptor sample k.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    // Triangle list, two triangles per cell
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn from_heightfield(heightfield: &HeightfieldDescriptor) -> Self {
        let n = heightfield.subdivisions() as usize;
        let side = n + 1;
        let vert_count = side * side;

        let mut positions = Vec::with_capacity(vert_count);
        let mut uvs = Vec::with_capacity(vert_count);

        for i in 0..side {
            for j in 0..side {
                positions.push(heightfield.world_position(j, i));
                uvs.push([j as f32 / n as f32, i as f32 / n as f32]);
            }
        }

        let mut indices = Vec::with_capacity(n * n * 6);
        for i in 0..n {
            for j in 0..n {
                let a = GridOrder::RowMajor.index(j, i, side) as u32;
                let b = a + 1;
                let c = GridOrder::RowMajor.index(j, i + 1, side) as u32;
                let d = c + 1;

                // (a, c, b) then (b, c, d) faces +y
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        let normals = vertex_normals(&positions, &indices);

        Self {
            positions,
            uvs,
            normals,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    // Flat [x, y, z, x, y, z, ...] view for vertex buffer upload
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn flat_uvs(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn flat_normals(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }
}

// Area-weighted vertex normals: every face adds its unnormalized normal
// to its three corners, then each sum is normalized
pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [ia, ib, ic] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let a = Vec3::from(positions[ia]);
        let b = Vec3::from(positions[ib]);
        let c = Vec3::from(positions[ic]);
        let face = (b - a).cross(c - a);
        sums[ia] += face;
        sums[ib] += face;
        sums[ic] += face;
    }

    sums.into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}
