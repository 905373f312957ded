use std::time::Instant;

use serde::{Deserialize, Serialize};

// Horizontal sway applied to grass vertices at draw time.
// Geometry is never touched; the renderer feeds one elapsed time per frame and
// offsets each vertex along x by an amount keyed on its blade role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSway {
    // Spatial wave count across the uv range
    pub wave_size: f32,
    // Peak offset of tip vertices
    pub tip_distance: f32,
    // Peak offset of mid vertices
    pub center_distance: f32,
    // Milliseconds per radian of phase
    pub wave_frequency: f32,
}

impl Default for WindSway {
    fn default() -> Self {
        Self {
            wave_size: 5.0,
            tip_distance: 0.2,
            center_distance: 0.1,
            wave_frequency: 1500.0,
        }
    }
}

impl WindSway {
    // Offset along x for a vertex with blade role weight `role` and texture coordinate `u`
    pub fn displacement(&self, role: f32, u: f32, elapsed_ms: f32) -> f32 {
        let reach = if role > 0.6 {
            self.tip_distance
        } else if role > 0.0 {
            self.center_distance
        } else {
            return 0.0;
        };
        (elapsed_ms / self.wave_frequency + u * self.wave_size).sin() * reach
    }

    // Displaced copy of one vertex position
    pub fn apply(&self, position: [f32; 3], role: f32, u: f32, elapsed_ms: f32) -> [f32; 3] {
        let [x, y, z] = position;
        [x + self.displacement(role, u, elapsed_ms), y, z]
    }
}

// Single monotonic time source shared by every animated material
#[derive(Debug, Clone, Copy)]
pub struct WindClock {
    start: Instant,
}

impl WindClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.start.elapsed().as_secs_f32() * 1000.0
    }
}

impl Default for WindClock {
    fn default() -> Self {
        Self::start()
    }
}
