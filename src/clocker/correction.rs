//! Iterative CTI correction.
//!
//! Starting from the observed data, each iteration adds CTI to the current
//! estimate and moves the estimate by the difference between the observed
//! data and that forward model.

use ndarray::{Array, ArrayView, Dimension, Zip};

use crate::error::{CtiError, Result};

pub(crate) fn picard<D, F>(
    data: ArrayView<f64, D>,
    iterations: usize,
    add_cti: F,
) -> Result<Array<f64, D>>
where
    D: Dimension,
    F: Fn(ArrayView<f64, D>) -> Result<Array<f64, D>>,
{
    if iterations == 0 {
        return Err(CtiError::InvalidIterations);
    }

    let mut guess = data.to_owned();
    let mut last_rms = f64::INFINITY;
    for iteration in 1..=iterations {
        let model = add_cti(guess.view())?;
        let mut sum_sq = 0.0;
        Zip::from(&mut guess)
            .and(&data)
            .and(&model)
            .for_each(|g, &d, &m| {
                let residual = d - m;
                sum_sq += residual * residual;
                *g += residual;
            });
        let rms = (sum_sq / data.len().max(1) as f64).sqrt();
        log::info!("CTI correction iteration {iteration}/{iterations}: residual rms {rms:.3e}");
        if rms > last_rms {
            log::warn!(
                "CTI correction residual grew at iteration {iteration} \
                 ({last_rms:.3e} -> {rms:.3e})"
            );
        }
        last_rms = rms;
    }
    Ok(guess)
}
