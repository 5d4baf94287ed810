use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::column::{ClockedColumn, ColumnClock};
use super::correction::picard;
use super::express::ExpressSchedule;
use super::roe::Roe;
use crate::cti::{Cti2D, CtiDirection};
use crate::error::{CtiError, Result};
use crate::layout::Layout2D;

/// Clocks 2D data: parallel transfers move charge along each column towards
/// row 0, then serial transfers move it along each row towards column 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Clocker2DRecord")]
pub struct Clocker2D {
    parallel_express: usize,
    parallel_roe: Roe,
    parallel_offset: usize,
    serial_express: usize,
    serial_roe: Roe,
    serial_offset: usize,
}

#[derive(Deserialize)]
struct Clocker2DRecord {
    #[serde(default = "default_express")]
    parallel_express: usize,
    #[serde(default)]
    parallel_roe: Roe,
    #[serde(default)]
    parallel_offset: usize,
    #[serde(default = "default_express")]
    serial_express: usize,
    #[serde(default)]
    serial_roe: Roe,
    #[serde(default)]
    serial_offset: usize,
}

fn default_express() -> usize {
    2
}

impl TryFrom<Clocker2DRecord> for Clocker2D {
    type Error = CtiError;

    fn try_from(r: Clocker2DRecord) -> Result<Self> {
        Ok(Clocker2D::new(r.parallel_express, r.serial_express)?
            .with_parallel_roe(r.parallel_roe)
            .with_parallel_offset(r.parallel_offset)
            .with_serial_roe(r.serial_roe)
            .with_serial_offset(r.serial_offset))
    }
}

impl Default for Clocker2D {
    fn default() -> Self {
        Self {
            parallel_express: default_express(),
            parallel_roe: Roe::default(),
            parallel_offset: 0,
            serial_express: default_express(),
            serial_roe: Roe::default(),
            serial_offset: 0,
        }
    }
}

impl Clocker2D {
    pub fn new(parallel_express: usize, serial_express: usize) -> Result<Self> {
        if parallel_express == 0 || serial_express == 0 {
            return Err(CtiError::InvalidExpress);
        }
        Ok(Self {
            parallel_express,
            serial_express,
            ..Self::default()
        })
    }

    pub fn with_parallel_roe(mut self, roe: Roe) -> Self {
        self.parallel_roe = roe;
        self
    }

    pub fn with_serial_roe(mut self, roe: Roe) -> Self {
        self.serial_roe = roe;
        self
    }

    pub fn with_parallel_offset(mut self, offset: usize) -> Self {
        self.parallel_offset = offset;
        self
    }

    pub fn with_serial_offset(mut self, offset: usize) -> Self {
        self.serial_offset = offset;
        self
    }

    pub fn parallel_express(&self) -> usize {
        self.parallel_express
    }

    pub fn serial_express(&self) -> usize {
        self.serial_express
    }

    pub fn parallel_roe(&self) -> &Roe {
        &self.parallel_roe
    }

    pub fn serial_roe(&self) -> &Roe {
        &self.serial_roe
    }

    pub fn add_cti(&self, data: ArrayView2<f64>, cti: &Cti2D) -> Result<Array2<f64>> {
        let mut image = data.to_owned();
        if image.is_empty() {
            return Ok(image);
        }
        if let Some(parallel) = cti.parallel() {
            image = clock_lanes(
                image.view(),
                Axis(1),
                parallel,
                &self.parallel_roe,
                self.parallel_express,
                self.parallel_offset,
            )?;
        }
        if let Some(serial) = cti.serial() {
            image = clock_lanes(
                image.view(),
                Axis(0),
                serial,
                &self.serial_roe,
                self.serial_express,
                self.serial_offset,
            )?;
        }
        Ok(image)
    }

    pub fn remove_cti(
        &self,
        data: ArrayView2<f64>,
        cti: &Cti2D,
        iterations: usize,
    ) -> Result<Array2<f64>> {
        picard(data, iterations, |guess| self.add_cti(guess, cti))
    }

    /// Correct several independent images, in parallel.
    pub fn remove_cti_list(
        &self,
        data_list: &[Array2<f64>],
        cti: &Cti2D,
        iterations: usize,
    ) -> Result<Vec<Array2<f64>>> {
        data_list
            .par_iter()
            .map(|data| self.remove_cti(data.view(), cti, iterations))
            .collect()
    }

    /// Add CTI to an image stored in the layout's orientation: the image is
    /// flipped so its readout corner sits at the origin, clocked, and flipped
    /// back.
    pub fn add_cti_via_layout(
        &self,
        data: ArrayView2<f64>,
        cti: &Cti2D,
        layout: &Layout2D,
    ) -> Result<Array2<f64>> {
        layout.check_shape(data.dim())?;
        let rotated = layout.flip_to_readout(data);
        let clocked = self.add_cti(rotated.view(), cti)?;
        Ok(layout.flip_to_readout(clocked.view()))
    }

    pub fn remove_cti_via_layout(
        &self,
        data: ArrayView2<f64>,
        cti: &Cti2D,
        layout: &Layout2D,
        iterations: usize,
    ) -> Result<Array2<f64>> {
        layout.check_shape(data.dim())?;
        let rotated = layout.flip_to_readout(data);
        let corrected = self.remove_cti(rotated.view(), cti, iterations)?;
        Ok(layout.flip_to_readout(corrected.view()))
    }
}

/// Clock every lane of `data` independently. Lanes are the subviews taken
/// along `lane_axis`: `Axis(1)` yields columns (parallel clocking), `Axis(0)`
/// rows (serial clocking).
fn clock_lanes(
    data: ArrayView2<f64>,
    lane_axis: Axis,
    direction: &CtiDirection,
    roe: &Roe,
    express: usize,
    offset: usize,
) -> Result<Array2<f64>> {
    let lane_length = data.len_of(Axis(1 - lane_axis.index()));
    let schedule = ExpressSchedule::new(express, roe.kind(), offset, lane_length)?;
    let clock = ColumnClock::new(direction, roe, schedule);

    let lanes: Vec<ArrayView1<f64>> = data.axis_iter(lane_axis).collect();
    let (unique, lane_to_unique) = if roe.fast_mode() {
        dedupe_lanes(&lanes)
    } else {
        ((0..lanes.len()).collect(), (0..lanes.len()).collect())
    };
    log::debug!(
        "Clocking {} of {} lanes ({} pixels each) with express {} ({} passes)",
        unique.len(),
        lanes.len(),
        lane_length,
        express,
        clock.n_passes()
    );

    let clocked: Vec<ClockedColumn> = unique
        .par_iter()
        .map(|&lane| clock.clock(&lanes[lane].to_vec()))
        .collect::<Result<_>>()?;
    let lost: f64 = lane_to_unique.iter().map(|&u| clocked[u].lost).sum();
    log::debug!("{lost:.3e} electrons left in traps past the array end");

    let mut output = Array2::zeros(data.dim());
    for (mut lane, &u) in output.axis_iter_mut(lane_axis).zip(&lane_to_unique) {
        lane.assign(&ArrayView1::from(&clocked[u].values));
    }
    Ok(output)
}

/// Indices of the first occurrence of each distinct lane, plus a map from
/// every lane to its position in that list.
fn dedupe_lanes(lanes: &[ArrayView1<f64>]) -> (Vec<usize>, Vec<usize>) {
    let mut seen: HashMap<Vec<u64>, usize> = HashMap::new();
    let mut unique = Vec::new();
    let mut lane_to_unique = Vec::with_capacity(lanes.len());
    for (i, lane) in lanes.iter().enumerate() {
        let key: Vec<u64> = lane.iter().map(|v| v.to_bits()).collect();
        let slot = *seen.entry(key).or_insert_with(|| {
            unique.push(i);
            unique.len() - 1
        });
        lane_to_unique.push(slot);
    }
    (unique, lane_to_unique)
}
