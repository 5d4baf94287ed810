use ndarray::{Array1, s};

use super::region::Region1D;
use crate::error::{CtiError, Result};
use crate::extract::{Extract1DKind, Extractor1D};

/// Geometry of a 1D dataset read out towards index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout1D {
    shape: usize,
    region_list: Vec<Region1D>,
    prescan: Option<Region1D>,
    overscan: Option<Region1D>,
}

impl Layout1D {
    pub fn new(
        shape: usize,
        region_list: Vec<Region1D>,
        prescan: Option<Region1D>,
        overscan: Option<Region1D>,
    ) -> Result<Self> {
        let all = region_list.iter().chain(prescan.iter()).chain(overscan.iter());
        for region in all {
            if !region.fits(shape) {
                return Err(CtiError::RegionOutOfBounds {
                    region: region.to_string(),
                    shape: vec![shape],
                });
            }
        }
        Ok(Self {
            shape,
            region_list,
            prescan,
            overscan,
        })
    }

    pub fn shape(&self) -> usize {
        self.shape
    }

    pub fn region_list(&self) -> &[Region1D] {
        &self.region_list
    }

    pub fn prescan(&self) -> Option<&Region1D> {
        self.prescan.as_ref()
    }

    pub fn overscan(&self) -> Option<&Region1D> {
        self.overscan.as_ref()
    }

    pub fn check_shape(&self, len: usize) -> Result<()> {
        if len != self.shape {
            return Err(CtiError::ShapeMismatch {
                expected: vec![self.shape],
                found: vec![len],
            });
        }
        Ok(())
    }

    /// Data before CTI: every charge region filled with `norm`, zero
    /// elsewhere.
    pub fn pre_cti_data_from(&self, norm: f64) -> Array1<f64> {
        let mut data = Array1::zeros(self.shape);
        for region in &self.region_list {
            data.slice_mut(s![region.x0()..region.x1()]).fill(norm);
        }
        data
    }

    pub fn extract(&self, kind: Extract1DKind) -> Extractor1D<'_> {
        Extractor1D::new(self, kind)
    }
}
