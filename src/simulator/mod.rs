//! Synthetic datasets: pre-CTI charge, clocked through a CTI model, with
//! Gaussian read noise on top.

mod dataset_1d;
mod imaging_ci;

pub use dataset_1d::{Dataset1D, SimulatorDataset1D};
pub use imaging_ci::{ImagingCI, NonUniform, SimulatorImagingCI};

use ndarray::{Array, Dimension};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::{CtiError, Result};

/// A Gaussian width must be finite and non-negative.
pub(crate) fn check_sigma(name: &str, sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma >= 0.0 {
        Ok(())
    } else {
        Err(CtiError::InvalidSimulation(format!(
            "{name} must be finite and >= 0, got {sigma}"
        )))
    }
}

/// Add read noise (Gaussian-distributed).
pub(crate) fn add_read_noise<D: Dimension>(
    data: &mut Array<f64, D>,
    sigma: f64,
    rng: &mut StdRng,
) -> Result<()> {
    check_sigma("read noise", sigma)?;
    if sigma == 0.0 {
        return Ok(());
    }
    let dist = Normal::new(0.0, sigma)
        .map_err(|e| CtiError::InvalidSimulation(format!("read noise {sigma}: {e}")))?;
    data.mapv_inplace(|pixel| pixel + dist.sample(rng));
    Ok(())
}
