use thiserror::Error;

// Everything that can go wrong while building or consuming a terrain generation
#[derive(Debug, Error)]
pub enum TerrainError {
    // Construction-time parameter violation; dimensions are never clamped
    #[error("invalid dimension: {field} must be {expected}, got {value}")]
    InvalidDimension {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("height count mismatch: expected {expected} samples, found {found}")]
    HeightCountMismatch { expected: usize, found: usize },

    // A consumer asked for terrain data before the first generation was installed
    #[error("terrain not ready: {0}")]
    NotReady(&'static str),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;

impl TerrainError {
    pub(crate) fn dimension(field: &'static str, expected: &'static str, value: f64) -> Self {
        TerrainError::InvalidDimension {
            field,
            expected,
            value,
        }
    }
}

impl From<toml::de::Error> for TerrainError {
    fn from(err: toml::de::Error) -> Self {
        TerrainError::Config(err.to_string())
    }
}
