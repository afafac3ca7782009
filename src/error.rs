use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwtError {
    /// Two rasters that must be co-indexed have different sizes.
    #[error("dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A ray walks outside of the stroke width map it is applied to.
    #[error("ray point {point:?} lies outside of {dimensions:?}")]
    RayOutOfBounds {
        point: (u32, u32),
        dimensions: (u32, u32),
    },

    /// The label raster cannot name any more components.
    #[error("too many components, labels are limited to {max}")]
    LabelOverflow { max: u32 },

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, SwtError>;

/// Fail with `DimensionMismatch` unless `actual == expected`.
pub fn ensure_dimensions(what: &'static str, expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(SwtError::DimensionMismatch { what, expected, actual });
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
