use ndarray::{Array1, ArrayView1, s};

use super::{check_pixels, median, missing_scan, stack_mean};
use crate::error::Result;
use crate::layout::{Layout1D, Region1D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract1DKind {
    Fpr,
    Eper,
    Prescan,
    Overscan,
}

impl Extract1DKind {
    pub const ALL: &[Extract1DKind] = &[
        Extract1DKind::Fpr,
        Extract1DKind::Eper,
        Extract1DKind::Prescan,
        Extract1DKind::Overscan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Extract1DKind::Fpr => "FPR",
            Extract1DKind::Eper => "EPER",
            Extract1DKind::Prescan => "Prescan",
            Extract1DKind::Overscan => "Overscan",
        }
    }
}

/// One kind of window over the regions of a [`Layout1D`].
#[derive(Debug, Clone, Copy)]
pub struct Extractor1D<'a> {
    layout: &'a Layout1D,
    kind: Extract1DKind,
}

impl<'a> Extractor1D<'a> {
    pub fn new(layout: &'a Layout1D, kind: Extract1DKind) -> Self {
        Self { layout, kind }
    }

    pub fn kind(&self) -> Extract1DKind {
        self.kind
    }

    pub fn region_list_from(&self, pixels: (i64, i64)) -> Result<Vec<Region1D>> {
        check_pixels(pixels)?;
        let anchors: Vec<usize> = match self.kind {
            Extract1DKind::Fpr => self.layout.region_list().iter().map(|r| r.x0()).collect(),
            Extract1DKind::Eper => self.layout.region_list().iter().map(|r| r.x1()).collect(),
            Extract1DKind::Prescan => {
                vec![self.layout.prescan().ok_or_else(|| missing_scan("prescan"))?.x0()]
            }
            Extract1DKind::Overscan => {
                vec![self.layout.overscan().ok_or_else(|| missing_scan("overscan"))?.x0()]
            }
        };

        let (a, b) = pixels;
        anchors
            .into_iter()
            .map(|x| Region1D::from_signed(x as i64 + a, x as i64 + b, self.layout.shape()))
            .collect()
    }

    pub fn array_list_from(
        &self,
        array: ArrayView1<f64>,
        pixels: (i64, i64),
    ) -> Result<Vec<Array1<f64>>> {
        self.layout.check_shape(array.len())?;
        Ok(self
            .region_list_from(pixels)?
            .iter()
            .map(|r| array.slice(s![r.x0()..r.x1()]).to_owned())
            .collect())
    }

    pub fn stacked_array_from(
        &self,
        array: ArrayView1<f64>,
        pixels: (i64, i64),
    ) -> Result<Array1<f64>> {
        stack_mean(self.array_list_from(array, pixels)?)
    }

    /// Median of each extracted window, one value per region.
    pub fn median_list_from(&self, array: ArrayView1<f64>, pixels: (i64, i64)) -> Result<Vec<f64>> {
        Ok(self
            .array_list_from(array, pixels)?
            .into_iter()
            .map(|window| median(window.to_vec()))
            .collect())
    }
}
