//! Preparing real charge-injection data before it is corrected or fitted.

use ndarray::{Array, Array2, ArrayView, ArrayView2, Axis, Dimension, Zip};

use crate::error::{CtiError, Result};
use crate::extract::Extract2DKind;
use crate::layout::Layout2D;

/// Subtract the bias level of every row, estimated as the median of that
/// row of the serial prescan. Rows the prescan does not cover are left as
/// they are.
pub fn bias_subtracted_via_serial_prescan(
    array: ArrayView2<f64>,
    layout: &Layout2D,
) -> Result<Array2<f64>> {
    layout.check_shape(array.dim())?;
    // Medians come back in readout order, so subtract in that frame.
    let frame = layout.to_readout_frame();
    let prescan = frame
        .serial_prescan()
        .ok_or_else(|| CtiError::InvalidRegion("layout has no serial prescan".to_string()))?;
    let width = prescan.shape().1 as i64;
    let mut output = layout.flip_to_readout(array);
    let bias_list = frame
        .extract(Extract2DKind::SerialPrescan)
        .median_list_from(output.view(), (0, width))?;

    let mut rows = output.slice_axis_mut(Axis(0), (prescan.y0()..prescan.y1()).into());
    for (mut row, bias) in rows.axis_iter_mut(Axis(0)).zip(&bias_list) {
        row -= *bias;
    }
    let output = layout.flip_to_readout(output.view());
    log::debug!(
        "Subtracted bias from {} rows (mean level {:.3})",
        bias_list.len(),
        bias_list.iter().sum::<f64>() / bias_list.len().max(1) as f64
    );
    Ok(output)
}

/// Estimate the charge injected before CTI from the inner parallel FPR: the
/// median of every injected column over the `pixels` window, which skips the
/// leading rows that CTI has eaten into. The window is counted from the edge
/// of each block that is read out first.
pub fn pre_cti_data_estimated_from(
    array: ArrayView2<f64>,
    layout: &Layout2D,
    pixels: (i64, i64),
) -> Result<Array2<f64>> {
    let injection_norm_list = layout
        .extract(Extract2DKind::ParallelFpr)
        .median_list_from(array, pixels)?;
    layout.pre_cti_data_non_uniform_from(&injection_norm_list, 0.0)
}

/// Pixels whose signal exceeds `threshold` times their noise.
pub fn cosmic_ray_flag_mask<D: Dimension>(
    data: ArrayView<f64, D>,
    noise_map: ArrayView<f64, D>,
    threshold: f64,
) -> Result<Array<bool, D>> {
    if data.shape() != noise_map.shape() {
        return Err(CtiError::ShapeMismatch {
            expected: data.shape().to_vec(),
            found: noise_map.shape().to_vec(),
        });
    }
    let mask = Zip::from(&data)
        .and(&noise_map)
        .map_collect(|&d, &n| d > threshold * n);
    log::debug!("Flagged {} cosmic ray pixels", mask.iter().filter(|&&m| m).count());
    Ok(mask)
}

/// The flagged part of `data`, zero elsewhere.
pub fn cosmic_ray_map_from<D: Dimension>(
    data: ArrayView<f64, D>,
    mask: ArrayView<bool, D>,
) -> Result<Array<f64, D>> {
    if data.shape() != mask.shape() {
        return Err(CtiError::ShapeMismatch {
            expected: data.shape().to_vec(),
            found: mask.shape().to_vec(),
        });
    }
    Ok(Zip::from(&data)
        .and(&mask)
        .map_collect(|&d, &m| if m { d } else { 0.0 }))
}
