//! Cut FPR, EPER, prescan and overscan windows out of CTI-affected data.
//!
//! A window is a pixel range `(a, b)` measured from an anchor on the clocking
//! axis: the start of each charge region for the FPR, its end for the EPER,
//! and the start of the scan region for prescans and overscans. Negative
//! offsets reach back across the anchor.

mod one_d;
mod two_d;

pub use one_d::{Extract1DKind, Extractor1D};
pub use two_d::{Extract2DKind, Extractor2D};

use ndarray::{Array, Dimension};

use crate::error::{CtiError, Result};

pub(crate) fn check_pixels(pixels: (i64, i64)) -> Result<()> {
    if pixels.0 >= pixels.1 {
        return Err(CtiError::InvalidPixels(pixels.0, pixels.1));
    }
    Ok(())
}

pub(crate) fn missing_scan(name: &str) -> CtiError {
    CtiError::InvalidRegion(format!("layout has no {name}"))
}

/// Elementwise mean of equally shaped arrays.
pub(crate) fn stack_mean<D: Dimension>(arrays: Vec<Array<f64, D>>) -> Result<Array<f64, D>> {
    let mut arrays = arrays.into_iter();
    let Some(mut sum) = arrays.next() else {
        return Err(CtiError::InvalidRegion("no regions to stack".to_string()));
    };
    let mut count = 1.0;
    for array in arrays {
        if array.shape() != sum.shape() {
            return Err(CtiError::ShapeMismatch {
                expected: sum.shape().to_vec(),
                found: array.shape().to_vec(),
            });
        }
        sum += &array;
        count += 1.0;
    }
    sum /= count;
    Ok(sum)
}

pub(crate) fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}
