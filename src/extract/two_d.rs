use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::{check_pixels, median, missing_scan, stack_mean};
use crate::error::{CtiError, Result};
use crate::layout::{Layout2D, Region2D};

/// Windows of a charge-injection image. Parallel windows run down the rows
/// (the parallel clocking axis), serial windows along the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract2DKind {
    ParallelFpr,
    ParallelEper,
    SerialFpr,
    SerialEper,
    ParallelOverscan,
    SerialPrescan,
    SerialOverscan,
}

impl Extract2DKind {
    pub const ALL: &[Extract2DKind] = &[
        Extract2DKind::ParallelFpr,
        Extract2DKind::ParallelEper,
        Extract2DKind::SerialFpr,
        Extract2DKind::SerialEper,
        Extract2DKind::ParallelOverscan,
        Extract2DKind::SerialPrescan,
        Extract2DKind::SerialOverscan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Extract2DKind::ParallelFpr => "Parallel FPR",
            Extract2DKind::ParallelEper => "Parallel EPER",
            Extract2DKind::SerialFpr => "Serial FPR",
            Extract2DKind::SerialEper => "Serial EPER",
            Extract2DKind::ParallelOverscan => "Parallel overscan",
            Extract2DKind::SerialPrescan => "Serial prescan",
            Extract2DKind::SerialOverscan => "Serial overscan",
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(
            self,
            Extract2DKind::ParallelFpr
                | Extract2DKind::ParallelEper
                | Extract2DKind::ParallelOverscan
        )
    }
}

/// One kind of window over the regions of a [`Layout2D`].
///
/// Windows are anchored in the readout frame: the FPR starts at the edge of
/// a region that is read out first and the EPER at the edge read out last.
/// Extracted arrays come back in that frame (row or column 0 nearest the
/// anchor), while [`Extractor2D::region_list_from`] reports the windows in
/// the stored coordinates of the layout.
#[derive(Debug, Clone)]
pub struct Extractor2D<'a> {
    layout: &'a Layout2D,
    frame: Layout2D,
    kind: Extract2DKind,
}

impl<'a> Extractor2D<'a> {
    pub fn new(layout: &'a Layout2D, kind: Extract2DKind) -> Self {
        Self {
            layout,
            frame: layout.to_readout_frame(),
            kind,
        }
    }

    pub fn kind(&self) -> Extract2DKind {
        self.kind
    }

    fn source_regions(&self) -> Result<Vec<Region2D>> {
        let scan = |region: Option<&Region2D>, name: &str| {
            region.copied().map(|r| vec![r]).ok_or_else(|| missing_scan(name))
        };
        match self.kind {
            Extract2DKind::ParallelFpr
            | Extract2DKind::ParallelEper
            | Extract2DKind::SerialFpr
            | Extract2DKind::SerialEper => Ok(self.frame.region_list().to_vec()),
            Extract2DKind::ParallelOverscan => {
                scan(self.frame.parallel_overscan(), "parallel overscan")
            }
            Extract2DKind::SerialPrescan => scan(self.frame.serial_prescan(), "serial prescan"),
            Extract2DKind::SerialOverscan => scan(self.frame.serial_overscan(), "serial overscan"),
        }
    }

    fn readout_regions(&self, pixels: (i64, i64)) -> Result<Vec<Region2D>> {
        check_pixels(pixels)?;
        let (a, b) = pixels;
        let shape = self.frame.shape();
        self.source_regions()?
            .iter()
            .map(|r| {
                let anchor = match self.kind {
                    Extract2DKind::ParallelEper => r.y1(),
                    Extract2DKind::SerialEper => r.x1(),
                    kind if kind.is_parallel() => r.y0(),
                    _ => r.x0(),
                } as i64;
                let (x0, x1) = (r.x0() as i64, r.x1() as i64);
                let (y0, y1) = (r.y0() as i64, r.y1() as i64);
                if self.kind.is_parallel() {
                    Region2D::from_signed(anchor + a, anchor + b, x0, x1, shape)
                } else {
                    Region2D::from_signed(y0, y1, anchor + a, anchor + b, shape)
                }
            })
            .collect()
    }

    /// Windows `pixels` wide along the clocking axis; the other axis keeps
    /// the extent of the source region.
    pub fn region_list_from(&self, pixels: (i64, i64)) -> Result<Vec<Region2D>> {
        Ok(self
            .readout_regions(pixels)?
            .iter()
            .map(|r| self.layout.flip_region(r))
            .collect())
    }

    pub fn array_list_from(
        &self,
        array: ArrayView2<f64>,
        pixels: (i64, i64),
    ) -> Result<Vec<Array2<f64>>> {
        self.layout.check_shape(array.dim())?;
        let regions = self.readout_regions(pixels)?;
        let flipped = self.layout.flip_to_readout(array);
        Ok(regions
            .iter()
            .map(|r| flipped.slice(r.slice()).to_owned())
            .collect())
    }

    pub fn stacked_array_from(
        &self,
        array: ArrayView2<f64>,
        pixels: (i64, i64),
    ) -> Result<Array2<f64>> {
        stack_mean(self.array_list_from(array, pixels)?)
    }

    /// Medians across every extracted window: one per column for parallel
    /// windows, one per row for serial windows, in readout order.
    pub fn median_list_from(
        &self,
        array: ArrayView2<f64>,
        pixels: (i64, i64),
    ) -> Result<Vec<f64>> {
        let windows = self.array_list_from(array, pixels)?;
        // Parallel windows are stacked on top of each other, so each column
        // gathers values from all of them; serial windows sit side by side.
        let (stack_axis, lane_axis) = if self.kind.is_parallel() {
            (Axis(0), Axis(1))
        } else {
            (Axis(1), Axis(0))
        };
        let Some(first) = windows.first() else {
            return Ok(Vec::new());
        };
        let lanes = first.len_of(lane_axis);
        if let Some(bad) = windows.iter().find(|w| w.len_of(lane_axis) != lanes) {
            return Err(CtiError::ShapeMismatch {
                expected: first.shape().to_vec(),
                found: bad.shape().to_vec(),
            });
        }

        let depth: usize = windows.iter().map(|w| w.len_of(stack_axis)).sum();
        Ok((0..lanes)
            .map(|lane| {
                let mut values = Vec::with_capacity(depth);
                for window in &windows {
                    values.extend(window.index_axis(lane_axis, lane).iter().copied());
                }
                median(values)
            })
            .collect())
    }

    /// The stacked window averaged across the axis that is not clocked,
    /// leaving a profile along the clocking axis.
    pub fn binned_array_1d_from(
        &self,
        array: ArrayView2<f64>,
        pixels: (i64, i64),
    ) -> Result<Array1<f64>> {
        let stacked = self.stacked_array_from(array, pixels)?;
        let across = if self.kind.is_parallel() { Axis(1) } else { Axis(0) };
        stacked
            .mean_axis(across)
            .ok_or_else(|| CtiError::InvalidRegion("window has no pixels to bin".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ReadoutCorner;
    use approx::assert_relative_eq;
    use ndarray::s;

    fn layout() -> Layout2D {
        Layout2D::new(
            (40, 20),
            vec![
                Region2D::new(5, 10, 4, 14).unwrap(),
                Region2D::new(20, 25, 4, 14).unwrap(),
            ],
        )
        .unwrap()
        .with_parallel_overscan(Region2D::new(35, 40, 4, 14).unwrap())
        .unwrap()
        .with_serial_prescan(Region2D::new(0, 40, 0, 4).unwrap())
        .unwrap()
        .with_serial_overscan(Region2D::new(0, 40, 14, 20).unwrap())
        .unwrap()
    }

    #[test]
    fn test_region_geometry() {
        let layout = layout();
        let regions = |kind: Extract2DKind, pixels| {
            layout.extract(kind).region_list_from(pixels).unwrap()
        };

        assert_eq!(
            regions(Extract2DKind::ParallelFpr, (0, 2)),
            vec![
                Region2D::new(5, 7, 4, 14).unwrap(),
                Region2D::new(20, 22, 4, 14).unwrap()
            ]
        );
        assert_eq!(
            regions(Extract2DKind::ParallelEper, (0, 3))[1],
            Region2D::new(25, 28, 4, 14).unwrap()
        );
        assert_eq!(
            regions(Extract2DKind::SerialFpr, (1, 3))[0],
            Region2D::new(5, 10, 5, 7).unwrap()
        );
        assert_eq!(
            regions(Extract2DKind::SerialEper, (0, 4))[0],
            Region2D::new(5, 10, 14, 18).unwrap()
        );
        assert_eq!(
            regions(Extract2DKind::ParallelOverscan, (1, 4)),
            vec![Region2D::new(36, 39, 4, 14).unwrap()]
        );
        assert_eq!(
            regions(Extract2DKind::SerialPrescan, (0, 2)),
            vec![Region2D::new(0, 40, 0, 2).unwrap()]
        );
        assert_eq!(
            regions(Extract2DKind::SerialOverscan, (2, 6)),
            vec![Region2D::new(0, 40, 16, 20).unwrap()]
        );
    }

    #[test]
    fn test_every_kind_counts_pixels() {
        let layout = layout();
        for kind in Extract2DKind::ALL {
            let regions = layout.extract(*kind).region_list_from((0, 2)).unwrap();
            let across = if kind.is_parallel() {
                regions[0].shape().1
            } else {
                regions[0].shape().0
            };
            let total: usize = regions.iter().map(|r| r.total_pixels()).sum();
            assert_eq!(total, 2 * across * regions.len(), "{}", kind.name());
        }
    }

    #[test]
    fn test_parallel_eper_stacks_and_bins() {
        let layout = layout();
        let mut image = Array2::zeros((40, 20));
        image.slice_mut(s![10..13, 4..14]).fill(3.0);
        image.slice_mut(s![25..28, 4..14]).fill(1.0);

        let eper = layout.extract(Extract2DKind::ParallelEper);
        let stacked = eper.stacked_array_from(image.view(), (0, 3)).unwrap();
        assert_eq!(stacked.dim(), (3, 10));
        assert_eq!(stacked[[0, 0]], 2.0);

        let binned = eper.binned_array_1d_from(image.view(), (0, 4)).unwrap();
        assert_eq!(binned.len(), 4);
        assert_relative_eq!(binned[0], 2.0);
        assert_relative_eq!(binned[3], 0.0);
    }

    #[test]
    fn test_parallel_fpr_median_per_column() {
        let layout = layout();
        let mut image = layout.pre_cti_data_uniform_from(100.0);
        image[[6, 5]] = 5e4;
        let medians = layout
            .extract(Extract2DKind::ParallelFpr)
            .median_list_from(image.view(), (0, 5))
            .unwrap();
        assert_eq!(medians.len(), 10);
        assert!(medians.iter().all(|&m| m == 100.0));
    }

    #[test]
    fn test_serial_median_per_row() {
        let layout = layout();
        let image = layout.pre_cti_data_uniform_from(100.0);
        let medians = layout
            .extract(Extract2DKind::SerialFpr)
            .median_list_from(image.view(), (0, 4))
            .unwrap();
        assert_eq!(medians, vec![100.0; 5]);
    }

    #[test]
    fn test_serial_regions_of_different_height_do_not_stack() {
        let layout = Layout2D::new(
            (30, 20),
            vec![
                Region2D::new(0, 5, 4, 10).unwrap(),
                Region2D::new(10, 18, 4, 10).unwrap(),
            ],
        )
        .unwrap();
        let image = Array2::zeros((30, 20));
        assert!(matches!(
            layout
                .extract(Extract2DKind::SerialEper)
                .stacked_array_from(image.view(), (0, 3)),
            Err(CtiError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_extraction_in_readout_frame() {
        let layout = layout().with_readout_corner(ReadoutCorner::BottomLeft);
        let image = layout.pre_cti_data_uniform_from(10.0);
        let flipped = layout.flip_to_readout(image.view());
        let frame = layout.to_readout_frame();
        let fpr = frame
            .extract(Extract2DKind::ParallelFpr)
            .stacked_array_from(flipped.view(), (0, 5))
            .unwrap();
        assert!(fpr.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_bottom_readout_eper_sits_above_each_block() {
        let layout = layout().with_readout_corner(ReadoutCorner::BottomLeft);
        let mut image = Array2::zeros((40, 20));
        // Trails of a bottom readout run upwards from each block.
        image.slice_mut(s![4, 4..14]).fill(3.0);
        image.slice_mut(s![19, 4..14]).fill(1.0);
        image.slice_mut(s![25..28, 4..14]).fill(50.0);

        let eper = layout.extract(Extract2DKind::ParallelEper);
        assert_eq!(
            eper.region_list_from((0, 3)).unwrap(),
            vec![
                Region2D::new(2, 5, 4, 14).unwrap(),
                Region2D::new(17, 20, 4, 14).unwrap()
            ]
        );
        let binned = eper.binned_array_1d_from(image.view(), (0, 3)).unwrap();
        assert_relative_eq!(binned[0], 2.0);
        assert_relative_eq!(binned[1], 0.0);

        // The first rows read out are the bottom rows of each block.
        let mut image = layout.pre_cti_data_uniform_from(100.0);
        image.slice_mut(s![9, 4..14]).fill(60.0);
        image.slice_mut(s![24, 4..14]).fill(80.0);
        let fpr = layout
            .extract(Extract2DKind::ParallelFpr)
            .binned_array_1d_from(image.view(), (0, 2))
            .unwrap();
        assert_relative_eq!(fpr[0], 70.0);
        assert_relative_eq!(fpr[1], 100.0);
    }

    #[test]
    fn test_right_readout_serial_prescan_follows_columns() {
        let layout = layout().with_readout_corner(ReadoutCorner::TopRight);
        let prescan = layout.extract(Extract2DKind::SerialPrescan);
        assert_eq!(
            prescan.region_list_from((0, 2)).unwrap(),
            vec![Region2D::new(0, 40, 2, 4).unwrap()]
        );
        let mut image = Array2::zeros((40, 20));
        image.column_mut(3).fill(7.0);
        let window = prescan.stacked_array_from(image.view(), (0, 2)).unwrap();
        assert_eq!(window.dim(), (40, 2));
        assert!(window.column(0).iter().all(|&v| v == 7.0));
        assert!(window.column(1).iter().all(|&v| v == 0.0));
    }
}
