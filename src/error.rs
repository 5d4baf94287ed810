//! Error type shared by every CTI operation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CtiError>;

/// Errors raised while building CTI models or clocking pixel arrays.
#[derive(Debug, Error)]
pub enum CtiError {
    #[error("invalid trap species: {0}")]
    InvalidTrap(String),

    #[error("invalid CCD volume: {0}")]
    InvalidCcd(String),

    #[error("trap list must contain at least one species")]
    EmptyTrapList,

    #[error("2D CTI model needs a parallel or a serial direction")]
    NoDirection,

    #[error("express must be at least 1")]
    InvalidExpress,

    #[error("express {express} exceeds the {transfers} transfers of the array")]
    ExpressTooLarge { express: usize, transfers: usize },

    #[error("correction needs at least one iteration")]
    InvalidIterations,

    #[error("invalid readout electronics: {0}")]
    InvalidRoe(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("invalid pixel window ({0}, {1}): start must be below end")]
    InvalidPixels(i64, i64),

    #[error("region {region} lies outside an array of shape {shape:?}")]
    RegionOutOfBounds { region: String, shape: Vec<usize> },

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("invalid simulation settings: {0}")]
    InvalidSimulation(String),

    #[error("non-finite charge {value} at pixel {index} during clocking")]
    NonFinite { index: usize, value: f64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
