use crate::NoiseGenerator;

// Frequencies of the default terrain relief: main shape, hills, details, micro-relief
pub const DEFAULT_FREQUENCIES: [f64; 4] = [3.0, 6.0, 12.0, 24.0];

// Sum of separable sinusoidal octaves, sin(x * f) * cos(y * f)
// Amplitude starts at 1.0 and halves after every octave.
// Stateless, so one instance can be shared by any number of readers.
#[derive(Debug, Clone, PartialEq)]
pub struct SineOctaves {
    frequencies: Vec<f64>,
}

impl SineOctaves {
    pub fn new(frequencies: Vec<f64>) -> Self {
        Self { frequencies }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    // Raw octave sum before normalization
    // Bounded by the sum of the amplitudes (1.875 for four octaves)
    pub fn raw_sum(&self, nx: f64, nz: f64) -> f64 {
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for &freq in &self.frequencies {
            total += amplitude * (nx * freq).sin() * (nz * freq).cos();
            amplitude *= 0.5;
        }
        total
    }
}

impl Default for SineOctaves {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCIES.to_vec())
    }
}

impl NoiseGenerator for SineOctaves {
    // Not clamped: the result can leave [0, 1] where several octaves line up
    fn get2(&self, x: f64, y: f64) -> f64 {
        normalize_height(self.raw_sum(x, y))
    }
}

// Maps an octave sum from roughly [-1, 1] onto roughly [0, 1]
#[inline]
pub fn normalize_height(sum: f64) -> f64 {
    (sum + 1.0) * 0.5
}
