use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::column::ColumnClock;
use super::correction::picard;
use super::express::ExpressSchedule;
use super::roe::Roe;
use crate::cti::Cti1D;
use crate::error::{CtiError, Result};
use crate::layout::Layout1D;

/// Clocks 1D data towards index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Clocker1DRecord")]
pub struct Clocker1D {
    express: usize,
    roe: Roe,
    offset: usize,
}

#[derive(Deserialize)]
struct Clocker1DRecord {
    express: usize,
    #[serde(default)]
    roe: Roe,
    #[serde(default)]
    offset: usize,
}

impl TryFrom<Clocker1DRecord> for Clocker1D {
    type Error = CtiError;

    fn try_from(r: Clocker1DRecord) -> Result<Self> {
        Ok(Clocker1D::new(r.express)?
            .with_roe(r.roe)
            .with_offset(r.offset))
    }
}

impl Default for Clocker1D {
    fn default() -> Self {
        Self {
            express: 2,
            roe: Roe::default(),
            offset: 0,
        }
    }
}

impl Clocker1D {
    /// `express` is the number of transfers simulated as one step; 1 is exact.
    pub fn new(express: usize) -> Result<Self> {
        if express == 0 {
            return Err(CtiError::InvalidExpress);
        }
        Ok(Self {
            express,
            ..Self::default()
        })
    }

    pub fn with_roe(mut self, roe: Roe) -> Self {
        self.roe = roe;
        self
    }

    /// Extra transfers between the first pixel and the readout.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn express(&self) -> usize {
        self.express
    }

    pub fn roe(&self) -> &Roe {
        &self.roe
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Clock `data` towards index 0. An empty array has nothing to clock and
    /// comes back unchanged.
    pub fn add_cti(&self, data: ArrayView1<f64>, cti: &Cti1D) -> Result<Array1<f64>> {
        if data.is_empty() {
            return Ok(data.to_owned());
        }
        let schedule =
            ExpressSchedule::new(self.express, self.roe.kind(), self.offset, data.len())?;
        let clock = ColumnClock::new(cti.direction(), &self.roe, schedule);
        log::debug!(
            "Clocking {} pixels with express {} ({} passes)",
            data.len(),
            self.express,
            clock.n_passes()
        );

        let column = data.to_vec();
        let clocked = clock.clock(&column)?;
        log::debug!("{:.3e} electrons left in traps past the array end", clocked.lost);
        Ok(Array1::from(clocked.values))
    }

    pub fn remove_cti(
        &self,
        data: ArrayView1<f64>,
        cti: &Cti1D,
        iterations: usize,
    ) -> Result<Array1<f64>> {
        picard(data, iterations, |guess| self.add_cti(guess, cti))
    }

    pub fn add_cti_via_layout(
        &self,
        data: ArrayView1<f64>,
        cti: &Cti1D,
        layout: &Layout1D,
    ) -> Result<Array1<f64>> {
        layout.check_shape(data.len())?;
        self.add_cti(data, cti)
    }

    pub fn remove_cti_via_layout(
        &self,
        data: ArrayView1<f64>,
        cti: &Cti1D,
        layout: &Layout1D,
        iterations: usize,
    ) -> Result<Array1<f64>> {
        layout.check_shape(data.len())?;
        self.remove_cti(data, cti, iterations)
    }
}
