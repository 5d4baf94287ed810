//! Charge trap species.
//!
//! A species is a population of traps sharing one release timescale. Its
//! density is the mean number of traps per pixel; timescales are in units of
//! one clock transfer.

mod watermark;

pub(crate) use watermark::TrapState;

use serde::{Deserialize, Serialize};

use crate::error::{CtiError, Result};

/// How a trap takes electrons from a passing charge cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capture {
    /// Every empty trap reached by the cloud is filled at once.
    Instant,
    /// Empty traps fill exponentially with this timescale.
    Timescale(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrapRecord", into = "TrapRecord")]
pub struct TrapSpecies {
    density: f64,
    release_timescale: f64,
    capture: Capture,
}

#[derive(Serialize, Deserialize)]
struct TrapRecord {
    density: f64,
    release_timescale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capture_timescale: Option<f64>,
}

impl TryFrom<TrapRecord> for TrapSpecies {
    type Error = CtiError;

    fn try_from(r: TrapRecord) -> Result<Self> {
        match r.capture_timescale {
            None => TrapSpecies::new(r.density, r.release_timescale),
            Some(c) => TrapSpecies::slow_capture(r.density, r.release_timescale, c),
        }
    }
}

impl From<TrapSpecies> for TrapRecord {
    fn from(t: TrapSpecies) -> Self {
        TrapRecord {
            density: t.density,
            release_timescale: t.release_timescale,
            capture_timescale: match t.capture {
                Capture::Instant => None,
                Capture::Timescale(c) => Some(c),
            },
        }
    }
}

impl TrapSpecies {
    /// Instant-capture species.
    pub fn new(density: f64, release_timescale: f64) -> Result<Self> {
        validate(density, release_timescale)?;
        Ok(Self {
            density,
            release_timescale,
            capture: Capture::Instant,
        })
    }

    /// Species whose traps capture over `capture_timescale` transfers.
    pub fn slow_capture(
        density: f64,
        release_timescale: f64,
        capture_timescale: f64,
    ) -> Result<Self> {
        validate(density, release_timescale)?;
        if !capture_timescale.is_finite() || capture_timescale <= 0.0 {
            return Err(CtiError::InvalidTrap(format!(
                "capture_timescale must be finite and > 0, got {capture_timescale}"
            )));
        }
        Ok(Self {
            density,
            release_timescale,
            capture: Capture::Timescale(capture_timescale),
        })
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn release_timescale(&self) -> f64 {
        self.release_timescale
    }

    pub fn capture(&self) -> Capture {
        self.capture
    }

    pub fn capture_instantaneous(&self) -> bool {
        self.capture == Capture::Instant
    }

    /// Fraction of held electrons kept after `dwell` transfers.
    pub(crate) fn retained_after(&self, dwell: f64) -> f64 {
        (-dwell / self.release_timescale).exp()
    }

    /// Fraction of empty reachable traps filled during `dwell` transfers.
    pub(crate) fn captured_during(&self, dwell: f64) -> f64 {
        match self.capture {
            Capture::Instant => 1.0,
            Capture::Timescale(t) => 1.0 - (-dwell / t).exp(),
        }
    }
}

fn validate(density: f64, release_timescale: f64) -> Result<()> {
    if !density.is_finite() || density < 0.0 {
        return Err(CtiError::InvalidTrap(format!(
            "density must be finite and >= 0, got {density}"
        )));
    }
    if !release_timescale.is_finite() || release_timescale <= 0.0 {
        return Err(CtiError::InvalidTrap(format!(
            "release_timescale must be finite and > 0, got {release_timescale}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_construction_rules() {
        assert!(TrapSpecies::new(0.0, 1.0).is_ok());
        assert!(matches!(
            TrapSpecies::new(-0.1, 1.0),
            Err(CtiError::InvalidTrap(_))
        ));
        assert!(TrapSpecies::new(1.0, 0.0).is_err());
        assert!(TrapSpecies::new(1.0, f64::INFINITY).is_err());
        assert!(TrapSpecies::slow_capture(1.0, 2.0, 0.0).is_err());
    }

    #[test]
    fn test_rates() {
        let trap = TrapSpecies::new(0.13, 1.25).unwrap();
        assert!(trap.capture_instantaneous());
        assert_relative_eq!(trap.retained_after(1.0), (-0.8f64).exp(), epsilon = 1e-12);
        assert_eq!(trap.captured_during(1.0), 1.0);

        let slow = TrapSpecies::slow_capture(0.13, 1.25, 0.5).unwrap();
        assert!(!slow.capture_instantaneous());
        assert_relative_eq!(slow.captured_during(1.0), 1.0 - (-2.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_json_shape() {
        let trap: TrapSpecies =
            serde_json::from_str(r#"{"density": 0.25, "release_timescale": 4.4}"#).unwrap();
        assert_eq!(trap.density(), 0.25);
        assert!(trap.capture_instantaneous());

        let text = serde_json::to_string(&trap).unwrap();
        assert!(!text.contains("capture_timescale"));

        let slow: TrapSpecies = serde_json::from_str(
            r#"{"density": 1.0, "release_timescale": 4.0, "capture_timescale": 0.5}"#,
        )
        .unwrap();
        assert_eq!(slow.capture(), Capture::Timescale(0.5));

        let negative = r#"{"density": 1.0, "release_timescale": -4.0}"#;
        assert!(serde_json::from_str::<TrapSpecies>(negative).is_err());
    }
}
