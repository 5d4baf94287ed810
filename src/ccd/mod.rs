//! CCD pixel volume model.
//!
//! A charge cloud only reaches the traps inside the volume it occupies. The
//! occupied fraction of a pixel grows as a power law of the cloud size between
//! a notch (charge too small to reach any traps) and the full well.

use serde::{Deserialize, Serialize};

use crate::error::{CtiError, Result};

/// Well-filling model for one clocking direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CcdVolumeRecord")]
pub struct CcdVolume {
    well_notch_depth: f64,
    well_fill_power: f64,
    full_well_depth: f64,
}

#[derive(Deserialize)]
struct CcdVolumeRecord {
    #[serde(default)]
    well_notch_depth: f64,
    well_fill_power: f64,
    full_well_depth: f64,
}

impl TryFrom<CcdVolumeRecord> for CcdVolume {
    type Error = CtiError;

    fn try_from(r: CcdVolumeRecord) -> Result<Self> {
        CcdVolume::new(r.well_notch_depth, r.well_fill_power, r.full_well_depth)
    }
}

impl CcdVolume {
    pub fn new(well_notch_depth: f64, well_fill_power: f64, full_well_depth: f64) -> Result<Self> {
        if !well_notch_depth.is_finite() || well_notch_depth < 0.0 {
            return Err(CtiError::InvalidCcd(format!(
                "well_notch_depth must be finite and >= 0, got {well_notch_depth}"
            )));
        }
        if !(well_fill_power > 0.0 && well_fill_power <= 1.0) {
            return Err(CtiError::InvalidCcd(format!(
                "well_fill_power must lie in (0, 1], got {well_fill_power}"
            )));
        }
        if !full_well_depth.is_finite() || full_well_depth <= well_notch_depth {
            return Err(CtiError::InvalidCcd(format!(
                "full_well_depth ({full_well_depth}) must exceed \
                 well_notch_depth ({well_notch_depth})"
            )));
        }
        Ok(Self {
            well_notch_depth,
            well_fill_power,
            full_well_depth,
        })
    }

    pub fn well_notch_depth(&self) -> f64 {
        self.well_notch_depth
    }

    pub fn well_fill_power(&self) -> f64 {
        self.well_fill_power
    }

    pub fn full_well_depth(&self) -> f64 {
        self.full_well_depth
    }

    /// Fraction of the pixel volume (and hence of its traps) reached by a
    /// cloud of `charge` electrons, in `[0, 1]`.
    pub fn fraction_filled(&self, charge: f64) -> f64 {
        if charge <= self.well_notch_depth {
            return 0.0;
        }
        let x = (charge - self.well_notch_depth) / (self.full_well_depth - self.well_notch_depth);
        x.powf(self.well_fill_power).clamp(0.0, 1.0)
    }
}
