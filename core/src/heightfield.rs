use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::NoiseGenerator;
use crate::error::{Result, TerrainError};

// Physical extent of the terrain: x and z are the horizontal size,
// y is the vertical amplitude applied to normalized heights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Scale {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("scale.x", self.x), ("scale.y", self.y), ("scale.z", self.z)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TerrainError::dimension(field, "> 0", value as f64));
            }
        }
        Ok(())
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(100.0, 1.5, 100.0)
    }
}

// Physical memory layout of a square (side × side) grid
// ix walks +x, iz walks +z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOrder {
    // iz * side + ix: rows of constant z, used by the descriptor and the render mesh
    RowMajor,
    // ix * side + iz: columns of constant x, used by the physics heightfield
    ColumnMajor,
}

impl GridOrder {
    #[inline]
    pub fn index(self, ix: usize, iz: usize, side: usize) -> usize {
        match self {
            GridOrder::RowMajor => iz * side + ix,
            GridOrder::ColumnMajor => ix * side + iz,
        }
    }
}

// Normalized terrain samples over a square grid centred on the origin.
// Immutable once built; share it behind an Arc.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldDescriptor {
    subdivisions: u32,
    scale: Scale,
    // GridOrder::RowMajor, (subdivisions + 1)² entries
    heights: Vec<f32>,
}

impl HeightfieldDescriptor {
    // Sample `noise` on a (subdivisions + 1)² grid.
    // Grid coordinates map to [0, 2π] in the noise domain so the default
    // sine octaves tile exactly once across the terrain.
    pub fn generate(subdivisions: u32, scale: Scale, noise: &dyn NoiseGenerator) -> Result<Self> {
        validate_subdivisions(subdivisions)?;
        scale.validate()?;

        let n = subdivisions as usize;
        let side = n + 1;
        let mut heights = vec![0.0f32; side * side];

        for i in 0..side {
            for j in 0..side {
                let x = j as f64 / n as f64;
                let z = i as f64 / n as f64;
                let height = noise.get2(x * TAU, z * TAU);
                heights[GridOrder::RowMajor.index(j, i, side)] = height as f32;
            }
        }

        log::debug!(
            "generated heightfield: {} subdivisions, {} samples, scale {:?}",
            subdivisions,
            heights.len(),
            scale
        );

        Ok(Self {
            subdivisions,
            scale,
            heights,
        })
    }

    // Rebuild a descriptor from stored parts; `heights` must be row-major
    pub fn from_parts(subdivisions: u32, scale: Scale, heights: Vec<f32>) -> Result<Self> {
        validate_subdivisions(subdivisions)?;
        scale.validate()?;

        let side = subdivisions as usize + 1;
        if heights.len() != side * side {
            return Err(TerrainError::HeightCountMismatch {
                expected: side * side,
                found: heights.len(),
            });
        }

        Ok(Self {
            subdivisions,
            scale,
            heights,
        })
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    // Samples per axis
    pub fn side(&self) -> usize {
        self.subdivisions as usize + 1
    }

    // Raw samples in GridOrder::RowMajor
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    // Normalized height of grid vertex (ix, iz); panics when out of range
    #[inline]
    pub fn height_at(&self, ix: usize, iz: usize) -> f32 {
        let side = self.side();
        assert!(ix < side && iz < side, "grid vertex ({ix}, {iz}) outside {side}x{side}");
        self.heights[GridOrder::RowMajor.index(ix, iz, side)]
    }

    // Copy of the samples laid out in `order`
    pub fn heights_in(&self, order: GridOrder) -> Vec<f32> {
        let side = self.side();
        let mut out = vec![0.0f32; side * side];
        for iz in 0..side {
            for ix in 0..side {
                out[order.index(ix, iz, side)] = self.height_at(ix, iz);
            }
        }
        out
    }

    // World-space position of grid vertex (ix, iz)
    pub fn world_position(&self, ix: usize, iz: usize) -> [f32; 3] {
        let n = self.subdivisions as f32;
        [
            (ix as f32 / n - 0.5) * self.scale.x,
            self.height_at(ix, iz) * self.scale.y,
            (iz as f32 / n - 0.5) * self.scale.z,
        ]
    }

    // Lowest and highest normalized sample
    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    // Explicitly transposed copy for the physics heightfield
    pub fn collision_heights(&self) -> CollisionHeights {
        CollisionHeights {
            heights: self.heights_in(CollisionHeights::ORDER),
            rows: self.subdivisions,
            cols: self.subdivisions,
            scale: self.scale,
        }
    }
}

fn validate_subdivisions(subdivisions: u32) -> Result<()> {
    if subdivisions < 1 {
        return Err(TerrainError::dimension(
            "subdivisions",
            ">= 1",
            subdivisions as f64,
        ));
    }
    Ok(())
}

// What the physics heightfield consumes.
// `rows` and `cols` count cells (rows along z, columns along x), so `heights`
// holds (rows + 1) * (cols + 1) samples stored column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionHeights {
    pub heights: Vec<f32>,
    pub rows: u32,
    pub cols: u32,
    pub scale: Scale,
}

impl CollisionHeights {
    pub const ORDER: GridOrder = GridOrder::ColumnMajor;

    // Normalized height of grid vertex (ix, iz)
    pub fn get(&self, ix: usize, iz: usize) -> f32 {
        self.heights[Self::ORDER.index(ix, iz, self.rows as usize + 1)]
    }
}
