use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{add_read_noise, check_sigma};
use crate::clocker::Clocker1D;
use crate::cti::Cti1D;
use crate::error::Result;
use crate::layout::Layout1D;

/// A 1D dataset: observed data, its noise map and the charge before CTI.
#[derive(Debug, Clone)]
pub struct Dataset1D {
    pub data: Array1<f64>,
    pub noise_map: Array1<f64>,
    pub pre_cti_data: Array1<f64>,
    pub layout: Layout1D,
}

/// Simulation parameters for 1D datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorDataset1D {
    pub read_noise: f64,
    pub norm: f64,
    pub seed: u64,
}

impl Default for SimulatorDataset1D {
    fn default() -> Self {
        Self {
            read_noise: 4.0,
            norm: 100.0,
            seed: 1,
        }
    }
}

impl SimulatorDataset1D {
    pub fn via_layout_from(
        &self,
        clocker: &Clocker1D,
        layout: &Layout1D,
        cti: &Cti1D,
    ) -> Result<Dataset1D> {
        check_sigma("read noise", self.read_noise)?;
        let pre_cti_data = layout.pre_cti_data_from(self.norm);
        let mut data = clocker.add_cti_via_layout(pre_cti_data.view(), cti, layout)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        add_read_noise(&mut data, self.read_noise, &mut rng)?;
        log::info!(
            "Simulated 1D dataset: {} pixels, norm {}, read noise {}",
            layout.shape(),
            self.norm,
            self.read_noise
        );

        Ok(Dataset1D {
            noise_map: Array1::from_elem(layout.shape(), self.read_noise),
            data,
            pre_cti_data,
            layout: layout.clone(),
        })
    }
}
