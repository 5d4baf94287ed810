//! Clocking of a single column of pixels towards the readout at index 0.

use super::express::ExpressSchedule;
use super::roe::Roe;
use crate::cti::CtiDirection;
use crate::error::{CtiError, Result};
use crate::traps::TrapState;

/// Per-phase release and capture fractions for every species.
#[derive(Debug, Clone)]
pub(crate) struct PhaseRates {
    retained: Vec<f64>,
    captured: Vec<f64>,
}

/// Everything a column needs that does not depend on its pixel values.
#[derive(Debug, Clone)]
pub(crate) struct ColumnClock<'a> {
    direction: &'a CtiDirection,
    densities: Vec<f64>,
    phases: Vec<PhaseRates>,
    schedule: ExpressSchedule,
}

/// Result of clocking one column.
#[derive(Debug, Clone)]
pub(crate) struct ClockedColumn {
    pub(crate) values: Vec<f64>,
    /// Electrons still held in traps when each pass ran off the array end.
    pub(crate) lost: f64,
}

impl<'a> ColumnClock<'a> {
    pub(crate) fn new(direction: &'a CtiDirection, roe: &Roe, schedule: ExpressSchedule) -> Self {
        let phases = roe
            .dwell_times()
            .iter()
            .map(|&dwell| PhaseRates {
                retained: direction
                    .trap_list()
                    .iter()
                    .map(|t| t.retained_after(dwell))
                    .collect(),
                captured: direction
                    .trap_list()
                    .iter()
                    .map(|t| t.captured_during(dwell))
                    .collect(),
            })
            .collect();
        Self {
            direction,
            densities: direction.densities(),
            phases,
            schedule,
        }
    }

    pub(crate) fn n_passes(&self) -> usize {
        self.schedule.n_passes()
    }

    pub(crate) fn clock(&self, column: &[f64]) -> Result<ClockedColumn> {
        let mut values = column.to_vec();
        if self.direction.is_trap_free() {
            return Ok(ClockedColumn { values, lost: 0.0 });
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CtiError::NonFinite { index, value });
        }

        let ccd = self.direction.ccd();
        let mut traps = TrapState::new(self.densities.len());
        let mut lost = 0.0;

        for pass in 0..self.schedule.n_passes() {
            traps.reset();
            for (index, value) in values.iter_mut().enumerate() {
                let weight = self.schedule.weight(pass, index);
                if weight == 0 {
                    continue;
                }
                traps.set_weight(weight as f64);

                let mut charge = *value;
                for phase in &self.phases {
                    charge += traps.release(&self.densities, &phase.retained);
                    let height = ccd.fraction_filled(charge);
                    charge -= traps.capture(charge, height, &self.densities, &phase.captured);
                }
                if !charge.is_finite() {
                    return Err(CtiError::NonFinite {
                        index,
                        value: charge,
                    });
                }
                *value = charge;
            }
            lost += traps.held(&self.densities);
        }

        Ok(ClockedColumn { values, lost })
    }
}
