//! CTI models: trap populations paired with a CCD volume, per clocking
//! direction.

use serde::{Deserialize, Serialize};

use crate::ccd::CcdVolume;
use crate::error::{CtiError, Result};
use crate::traps::TrapSpecies;

/// Traps and well-filling model for one clocking direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CtiDirectionRecord")]
pub struct CtiDirection {
    trap_list: Vec<TrapSpecies>,
    ccd: CcdVolume,
}

#[derive(Deserialize)]
struct CtiDirectionRecord {
    trap_list: Vec<TrapSpecies>,
    ccd: CcdVolume,
}

impl TryFrom<CtiDirectionRecord> for CtiDirection {
    type Error = CtiError;

    fn try_from(r: CtiDirectionRecord) -> Result<Self> {
        CtiDirection::new(r.trap_list, r.ccd)
    }
}

impl CtiDirection {
    pub fn new(trap_list: Vec<TrapSpecies>, ccd: CcdVolume) -> Result<Self> {
        if trap_list.is_empty() {
            return Err(CtiError::EmptyTrapList);
        }
        Ok(Self { trap_list, ccd })
    }

    pub fn trap_list(&self) -> &[TrapSpecies] {
        &self.trap_list
    }

    pub fn ccd(&self) -> &CcdVolume {
        &self.ccd
    }

    pub(crate) fn densities(&self) -> Vec<f64> {
        self.trap_list.iter().map(|t| t.density()).collect()
    }

    /// True when no trap can capture anything.
    pub fn is_trap_free(&self) -> bool {
        self.trap_list.iter().all(|t| t.density() == 0.0)
    }
}

/// CTI model for 1D data (a single column read out towards index 0).
///
/// Serializes as `{"trap_list": [...], "ccd": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cti1D {
    direction: CtiDirection,
}

impl Cti1D {
    pub fn new(trap_list: Vec<TrapSpecies>, ccd: CcdVolume) -> Result<Self> {
        Ok(Self {
            direction: CtiDirection::new(trap_list, ccd)?,
        })
    }

    pub fn trap_list(&self) -> &[TrapSpecies] {
        self.direction.trap_list()
    }

    pub fn ccd(&self) -> &CcdVolume {
        self.direction.ccd()
    }

    pub fn direction(&self) -> &CtiDirection {
        &self.direction
    }
}

/// CTI model for 2D data with optional parallel and serial directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Cti2DRecord", into = "Cti2DRecord")]
pub struct Cti2D {
    parallel: Option<CtiDirection>,
    serial: Option<CtiDirection>,
}

#[derive(Serialize, Deserialize)]
struct Cti2DRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parallel_trap_list: Option<Vec<TrapSpecies>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parallel_ccd: Option<CcdVolume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serial_trap_list: Option<Vec<TrapSpecies>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serial_ccd: Option<CcdVolume>,
}

fn direction_from(
    name: &str,
    trap_list: Option<Vec<TrapSpecies>>,
    ccd: Option<CcdVolume>,
) -> Result<Option<CtiDirection>> {
    match (trap_list, ccd) {
        (None, None) => Ok(None),
        (Some(traps), Some(ccd)) => CtiDirection::new(traps, ccd).map(Some),
        (Some(_), None) => Err(CtiError::InvalidCcd(format!(
            "{name} traps given without a {name} CCD"
        ))),
        (None, Some(_)) => Err(CtiError::EmptyTrapList),
    }
}

impl TryFrom<Cti2DRecord> for Cti2D {
    type Error = CtiError;

    fn try_from(r: Cti2DRecord) -> Result<Self> {
        Cti2D::new(
            direction_from("parallel", r.parallel_trap_list, r.parallel_ccd)?,
            direction_from("serial", r.serial_trap_list, r.serial_ccd)?,
        )
    }
}

impl From<Cti2D> for Cti2DRecord {
    fn from(c: Cti2D) -> Self {
        let (parallel_trap_list, parallel_ccd) = match c.parallel {
            Some(d) => (Some(d.trap_list), Some(d.ccd)),
            None => (None, None),
        };
        let (serial_trap_list, serial_ccd) = match c.serial {
            Some(d) => (Some(d.trap_list), Some(d.ccd)),
            None => (None, None),
        };
        Cti2DRecord {
            parallel_trap_list,
            parallel_ccd,
            serial_trap_list,
            serial_ccd,
        }
    }
}

impl Cti2D {
    pub fn new(parallel: Option<CtiDirection>, serial: Option<CtiDirection>) -> Result<Self> {
        if parallel.is_none() && serial.is_none() {
            return Err(CtiError::NoDirection);
        }
        Ok(Self { parallel, serial })
    }

    pub fn parallel_only(direction: CtiDirection) -> Self {
        Self {
            parallel: Some(direction),
            serial: None,
        }
    }

    pub fn serial_only(direction: CtiDirection) -> Self {
        Self {
            parallel: None,
            serial: Some(direction),
        }
    }

    pub fn parallel(&self) -> Option<&CtiDirection> {
        self.parallel.as_ref()
    }

    pub fn serial(&self) -> Option<&CtiDirection> {
        self.serial.as_ref()
    }
}

#[derive(Debug, Clone, Copy)]
enum TrapParams {
    Instant(f64, f64),
    Slow(f64, f64, f64),
}

impl TrapParams {
    fn build(self) -> Result<TrapSpecies> {
        match self {
            TrapParams::Instant(d, r) => TrapSpecies::new(d, r),
            TrapParams::Slow(d, r, c) => TrapSpecies::slow_capture(d, r, c),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DirectionParams {
    traps: Vec<TrapParams>,
    ccd: Option<(f64, f64, f64)>,
}

impl DirectionParams {
    fn is_empty(&self) -> bool {
        self.traps.is_empty() && self.ccd.is_none()
    }

    fn build(&self, name: &str) -> Result<Option<CtiDirection>> {
        if self.is_empty() {
            return Ok(None);
        }
        let trap_list = self
            .traps
            .iter()
            .map(|t| t.build())
            .collect::<Result<Vec<_>>>()?;
        let (notch, power, full_well) = self.ccd.ok_or_else(|| {
            CtiError::InvalidCcd(format!("{name} traps given without a {name} CCD"))
        })?;
        let ccd = CcdVolume::new(notch, power, full_well)?;
        CtiDirection::new(trap_list, ccd).map(Some)
    }
}

/// Accumulates trap species and CCD parameters, validating everything when
/// the model is built.
///
/// ```
/// use ccd_cti::CtiModelBuilder;
///
/// let cti = CtiModelBuilder::new()
///     .trap(0.13, 1.25)
///     .trap(0.25, 4.4)
///     .ccd(0.0, 0.58, 200_000.0)
///     .build_1d()
///     .unwrap();
/// assert_eq!(cti.trap_list().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CtiModelBuilder {
    parallel: DirectionParams,
    serial: DirectionParams,
}

impl CtiModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instant-capture trap for a 1D model (same as `parallel_trap`).
    pub fn trap(self, density: f64, release_timescale: f64) -> Self {
        self.parallel_trap(density, release_timescale)
    }

    /// CCD volume for a 1D model (same as `parallel_ccd`).
    pub fn ccd(self, well_notch_depth: f64, well_fill_power: f64, full_well_depth: f64) -> Self {
        self.parallel_ccd(well_notch_depth, well_fill_power, full_well_depth)
    }

    pub fn parallel_trap(mut self, density: f64, release_timescale: f64) -> Self {
        self.parallel
            .traps
            .push(TrapParams::Instant(density, release_timescale));
        self
    }

    pub fn parallel_slow_trap(
        mut self,
        density: f64,
        release_timescale: f64,
        capture_timescale: f64,
    ) -> Self {
        self.parallel.traps.push(TrapParams::Slow(
            density,
            release_timescale,
            capture_timescale,
        ));
        self
    }

    pub fn parallel_ccd(
        mut self,
        well_notch_depth: f64,
        well_fill_power: f64,
        full_well_depth: f64,
    ) -> Self {
        self.parallel.ccd = Some((well_notch_depth, well_fill_power, full_well_depth));
        self
    }

    pub fn serial_trap(mut self, density: f64, release_timescale: f64) -> Self {
        self.serial
            .traps
            .push(TrapParams::Instant(density, release_timescale));
        self
    }

    pub fn serial_slow_trap(
        mut self,
        density: f64,
        release_timescale: f64,
        capture_timescale: f64,
    ) -> Self {
        self.serial.traps.push(TrapParams::Slow(
            density,
            release_timescale,
            capture_timescale,
        ));
        self
    }

    pub fn serial_ccd(
        mut self,
        well_notch_depth: f64,
        well_fill_power: f64,
        full_well_depth: f64,
    ) -> Self {
        self.serial.ccd = Some((well_notch_depth, well_fill_power, full_well_depth));
        self
    }

    pub fn build_1d(&self) -> Result<Cti1D> {
        if !self.serial.is_empty() {
            return Err(CtiError::InvalidTrap(
                "serial parameters cannot form a 1D model".to_string(),
            ));
        }
        match self.parallel.build("1D")? {
            Some(direction) => Ok(Cti1D { direction }),
            None => Err(CtiError::EmptyTrapList),
        }
    }

    pub fn build_2d(&self) -> Result<Cti2D> {
        Cti2D::new(
            self.parallel.build("parallel")?,
            self.serial.build("serial")?,
        )
    }
}
