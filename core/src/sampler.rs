use crate::heightfield::HeightfieldDescriptor;

// The one query a character controller needs to stand on the terrain
pub trait GroundQuery {
    // World-space ground height at world (x, z)
    fn ground_height(&self, x: f32, z: f32) -> f32;
}

// Bilinear world-space height at (x, z), or 0.0 while no terrain exists yet
pub fn sample_height(heightfield: Option<&HeightfieldDescriptor>, x: f32, z: f32) -> f32 {
    match heightfield {
        Some(hf) => hf.sample_height(x, z),
        None => 0.0,
    }
}

impl HeightfieldDescriptor {
    // Bilinear interpolation over the grid at world (x, z).
    // Coordinates outside the terrain saturate to the boundary; NaN lands on the
    // low edge.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let n = self.subdivisions();
        let scale = self.scale();
        let grid_x = to_grid(x, scale.x, n);
        let grid_z = to_grid(z, scale.z, n);

        let x0 = grid_x.floor() as u32;
        let z0 = grid_z.floor() as u32;
        let x1 = (x0 + 1).min(n);
        let z1 = (z0 + 1).min(n);

        let wx = grid_x - x0 as f32;
        let wz = grid_z - z0 as f32;

        let h00 = self.height_at(x0 as usize, z0 as usize);
        let h10 = self.height_at(x1 as usize, z0 as usize);
        let h01 = self.height_at(x0 as usize, z1 as usize);
        let h11 = self.height_at(x1 as usize, z1 as usize);

        let h0 = lerp(h00, h10, wx);
        let h1 = lerp(h01, h11, wx);
        lerp(h0, h1, wz) * scale.y
    }
}

impl GroundQuery for HeightfieldDescriptor {
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        self.sample_height(x, z)
    }
}

impl GroundQuery for Option<&HeightfieldDescriptor> {
    fn ground_height(&self, x: f32, z: f32) -> f32 {
        sample_height(*self, x, z)
    }
}

// World coordinate → continuous grid coordinate in [0, n]
#[inline]
fn to_grid(world: f32, extent: f32, subdivisions: u32) -> f32 {
    let n = subdivisions as f32;
    // max/min rather than clamp: NaN resolves to 0 instead of propagating
    ((world / extent + 0.5) * n).max(0.0).min(n)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
