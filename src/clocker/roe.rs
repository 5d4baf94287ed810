use serde::{Deserialize, Serialize};

use crate::error::{CtiError, Result};

/// Clocking sequence used by the readout electronics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoeKind {
    /// Each pixel travels from its own position to the readout.
    #[default]
    Standard,
    /// Charge is injected at the far end, so every pixel crosses the whole
    /// array.
    ChargeInjection,
}

impl RoeKind {
    pub const ALL: &[RoeKind] = &[RoeKind::Standard, RoeKind::ChargeInjection];

    pub fn name(self) -> &'static str {
        match self {
            RoeKind::Standard => "Standard",
            RoeKind::ChargeInjection => "Charge Injection",
        }
    }
}

/// Readout electronics for one clocking direction.
///
/// `dwell_times` holds the time spent in each clock phase of one transfer,
/// in transfer units; its length is the number of phases. `fast_mode` clocks
/// each distinct column (or row) once and copies the result to its
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoeRecord")]
pub struct Roe {
    kind: RoeKind,
    dwell_times: Vec<f64>,
    fast_mode: bool,
}

#[derive(Deserialize)]
struct RoeRecord {
    #[serde(default)]
    kind: RoeKind,
    #[serde(default = "default_dwell_times")]
    dwell_times: Vec<f64>,
    #[serde(default)]
    fast_mode: bool,
}

fn default_dwell_times() -> Vec<f64> {
    vec![1.0]
}

impl TryFrom<RoeRecord> for Roe {
    type Error = CtiError;

    fn try_from(r: RoeRecord) -> Result<Self> {
        Ok(Roe::new(r.kind, r.dwell_times)?.with_fast_mode(r.fast_mode))
    }
}

impl Default for Roe {
    fn default() -> Self {
        Self {
            kind: RoeKind::Standard,
            dwell_times: default_dwell_times(),
            fast_mode: false,
        }
    }
}

impl Roe {
    pub fn new(kind: RoeKind, dwell_times: Vec<f64>) -> Result<Self> {
        if dwell_times.is_empty() {
            return Err(CtiError::InvalidRoe(
                "at least one clock phase is required".to_string(),
            ));
        }
        if let Some(bad) = dwell_times.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return Err(CtiError::InvalidRoe(format!(
                "dwell times must be finite and > 0, got {bad}"
            )));
        }
        Ok(Self {
            kind,
            dwell_times,
            fast_mode: false,
        })
    }

    /// Single-phase charge-injection readout with fast mode on, the usual
    /// setup for uniform charge-injection images.
    pub fn charge_injection() -> Self {
        Self {
            kind: RoeKind::ChargeInjection,
            dwell_times: default_dwell_times(),
            fast_mode: true,
        }
    }

    pub fn with_fast_mode(mut self, fast_mode: bool) -> Self {
        self.fast_mode = fast_mode;
        self
    }

    pub fn kind(&self) -> RoeKind {
        self.kind
    }

    pub fn dwell_times(&self) -> &[f64] {
        &self.dwell_times
    }

    pub fn n_phases(&self) -> usize {
        self.dwell_times.len()
    }

    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let roe = Roe::default();
        assert_eq!(roe.kind(), RoeKind::Standard);
        assert_eq!(roe.n_phases(), 1);
        assert!(!roe.fast_mode());

        let ci = Roe::charge_injection();
        assert_eq!(ci.kind(), RoeKind::ChargeInjection);
        assert!(ci.fast_mode());
    }

    #[test]
    fn test_invalid_dwell_times() {
        assert!(matches!(
            Roe::new(RoeKind::Standard, vec![]),
            Err(CtiError::InvalidRoe(_))
        ));
        assert!(Roe::new(RoeKind::Standard, vec![0.5, 0.0]).is_err());
        assert!(Roe::new(RoeKind::Standard, vec![0.5, f64::NAN]).is_err());
        assert_eq!(
            Roe::new(RoeKind::Standard, vec![0.3, 0.3, 0.4]).unwrap().n_phases(),
            3
        );
    }

    #[test]
    fn test_json_defaults() {
        let roe: Roe = serde_json::from_str(r#"{"kind": "charge_injection"}"#).unwrap();
        assert_eq!(roe.kind(), RoeKind::ChargeInjection);
        assert_eq!(roe.dwell_times(), &[1.0]);
        assert!(!roe.fast_mode());

        assert!(serde_json::from_str::<Roe>(r#"{"dwell_times": []}"#).is_err());
    }
}
