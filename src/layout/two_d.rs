use ndarray::{Array2, ArrayView2, s};

use super::ReadoutCorner;
use super::region::Region2D;
use crate::error::{CtiError, Result};
use crate::extract::{Extract2DKind, Extractor2D};

/// Geometry of a 2D charge-injection image.
///
/// Region coordinates are given in the stored orientation of the image.
/// Extraction and non-uniform injection work in the readout frame, where the
/// readout corner sits at `(0, 0)`, so windows are anchored on the side of
/// each region that is read out first whatever the corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout2D {
    shape: (usize, usize),
    region_list: Vec<Region2D>,
    parallel_overscan: Option<Region2D>,
    serial_prescan: Option<Region2D>,
    serial_overscan: Option<Region2D>,
    readout_corner: ReadoutCorner,
}

impl Layout2D {
    pub fn new(shape: (usize, usize), region_list: Vec<Region2D>) -> Result<Self> {
        for region in &region_list {
            check_fits(region, shape)?;
        }
        Ok(Self {
            shape,
            region_list,
            parallel_overscan: None,
            serial_prescan: None,
            serial_overscan: None,
            readout_corner: ReadoutCorner::default(),
        })
    }

    pub fn with_parallel_overscan(mut self, region: Region2D) -> Result<Self> {
        check_fits(&region, self.shape)?;
        self.parallel_overscan = Some(region);
        Ok(self)
    }

    pub fn with_serial_prescan(mut self, region: Region2D) -> Result<Self> {
        check_fits(&region, self.shape)?;
        self.serial_prescan = Some(region);
        Ok(self)
    }

    pub fn with_serial_overscan(mut self, region: Region2D) -> Result<Self> {
        check_fits(&region, self.shape)?;
        self.serial_overscan = Some(region);
        Ok(self)
    }

    pub fn with_readout_corner(mut self, corner: ReadoutCorner) -> Self {
        self.readout_corner = corner;
        self
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn region_list(&self) -> &[Region2D] {
        &self.region_list
    }

    pub fn parallel_overscan(&self) -> Option<&Region2D> {
        self.parallel_overscan.as_ref()
    }

    pub fn serial_prescan(&self) -> Option<&Region2D> {
        self.serial_prescan.as_ref()
    }

    pub fn serial_overscan(&self) -> Option<&Region2D> {
        self.serial_overscan.as_ref()
    }

    pub fn readout_corner(&self) -> ReadoutCorner {
        self.readout_corner
    }

    pub fn check_shape(&self, dim: (usize, usize)) -> Result<()> {
        if dim != self.shape {
            return Err(CtiError::ShapeMismatch {
                expected: vec![self.shape.0, self.shape.1],
                found: vec![dim.0, dim.1],
            });
        }
        Ok(())
    }

    /// Flip `data` so the readout corner lands on `(0, 0)`. Flipping is its
    /// own inverse, so the same call maps clocked data back.
    pub fn flip_to_readout(&self, data: ArrayView2<f64>) -> Array2<f64> {
        let rows = self.readout_corner.flips_rows();
        let cols = self.readout_corner.flips_cols();
        match (rows, cols) {
            (false, false) => data.to_owned(),
            (true, false) => data.slice(s![..;-1, ..]).to_owned(),
            (false, true) => data.slice(s![.., ..;-1]).to_owned(),
            (true, true) => data.slice(s![..;-1, ..;-1]).to_owned(),
        }
    }

    /// Map a region between the stored and the readout frame; like
    /// [`Layout2D::flip_to_readout`] the mapping is its own inverse.
    pub fn flip_region(&self, region: &Region2D) -> Region2D {
        let (rows, cols) = self.shape;
        let mut region = *region;
        if self.readout_corner.flips_rows() {
            region = region.flip_rows(rows);
        }
        if self.readout_corner.flips_cols() {
            region = region.flip_cols(cols);
        }
        region
    }

    /// This layout as seen after [`Layout2D::flip_to_readout`].
    pub fn to_readout_frame(&self) -> Layout2D {
        let flip = |region: &Region2D| self.flip_region(region);
        Layout2D {
            shape: self.shape,
            region_list: self.region_list.iter().map(flip).collect(),
            parallel_overscan: self.parallel_overscan.as_ref().map(flip),
            serial_prescan: self.serial_prescan.as_ref().map(flip),
            serial_overscan: self.serial_overscan.as_ref().map(flip),
            readout_corner: ReadoutCorner::TopLeft,
        }
    }

    /// Charge-injection image before CTI: every charge region filled with
    /// `norm`, zero elsewhere.
    pub fn pre_cti_data_uniform_from(&self, norm: f64) -> Array2<f64> {
        let mut data = Array2::zeros(self.shape);
        for region in &self.region_list {
            data.slice_mut(region.slice()).fill(norm);
        }
        data
    }

    /// Charge-injection image whose level varies across columns and down
    /// each region. `injection_norm_list` holds one normalization per column
    /// of a charge region (as returned by the parallel FPR medians), so every
    /// region must be that wide. Row `r` of a region is scaled by
    /// `(r + 1)^row_slope`. Rows and columns are counted in the readout frame,
    /// from the edge of the region that is read out first.
    pub fn pre_cti_data_non_uniform_from(
        &self,
        injection_norm_list: &[f64],
        row_slope: f64,
    ) -> Result<Array2<f64>> {
        if self.readout_corner != ReadoutCorner::TopLeft {
            let data = self
                .to_readout_frame()
                .pre_cti_data_non_uniform_from(injection_norm_list, row_slope)?;
            return Ok(self.flip_to_readout(data.view()));
        }
        let mut data = Array2::zeros(self.shape);
        for region in &self.region_list {
            if region.shape().1 != injection_norm_list.len() {
                return Err(CtiError::ShapeMismatch {
                    expected: vec![region.shape().1],
                    found: vec![injection_norm_list.len()],
                });
            }
            let mut block = data.slice_mut(region.slice());
            for (r, mut row) in block.rows_mut().into_iter().enumerate() {
                let scale = ((r + 1) as f64).powf(row_slope);
                for (pixel, norm) in row.iter_mut().zip(injection_norm_list) {
                    *pixel = norm * scale;
                }
            }
        }
        Ok(data)
    }

    pub fn extract(&self, kind: Extract2DKind) -> Extractor2D<'_> {
        Extractor2D::new(self, kind)
    }
}

fn check_fits(region: &Region2D, shape: (usize, usize)) -> Result<()> {
    if !region.fits(shape) {
        return Err(CtiError::RegionOutOfBounds {
            region: region.to_string(),
            shape: vec![shape.0, shape.1],
        });
    }
    Ok(())
}
