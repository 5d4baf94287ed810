use ndarray::{Array2, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use super::{add_read_noise, check_sigma};
use crate::clocker::Clocker2D;
use crate::cti::Cti2D;
use crate::error::{CtiError, Result};
use crate::layout::Layout2D;

/// A charge-injection image with its noise map and the charge before CTI.
#[derive(Debug, Clone)]
pub struct ImagingCI {
    pub data: Array2<f64>,
    pub noise_map: Array2<f64>,
    pub pre_cti_data: Array2<f64>,
    pub cosmic_ray_map: Option<Array2<f64>>,
    pub layout: Layout2D,
}

/// Column-to-column scatter and row-wise decay of the injected charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonUniform {
    pub column_sigma: f64,
    pub row_slope: f64,
}

impl NonUniform {
    /// One normalization per injected column, drawn around `norm` and kept
    /// non-negative.
    fn injection_norm_list(
        &self,
        norm: f64,
        columns: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<f64>> {
        check_sigma("column sigma", self.column_sigma)?;
        let dist = Normal::new(norm, self.column_sigma).map_err(|e| {
            CtiError::InvalidSimulation(format!("column sigma {}: {e}", self.column_sigma))
        })?;
        Ok((0..columns).map(|_| dist.sample(rng).max(0.0)).collect())
    }
}

/// Simulation parameters for charge-injection imaging.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorImagingCI {
    pub read_noise: f64,
    pub norm: f64,
    pub seed: u64,
    pub non_uniform: Option<NonUniform>,
}

impl Default for SimulatorImagingCI {
    fn default() -> Self {
        Self {
            read_noise: 4.0,
            norm: 10_000.0,
            seed: 1,
            non_uniform: None,
        }
    }
}

impl SimulatorImagingCI {
    pub fn via_layout_from(
        &self,
        clocker: &Clocker2D,
        layout: &Layout2D,
        cti: &Cti2D,
    ) -> Result<ImagingCI> {
        self.simulate(clocker, layout, cti, None)
    }

    /// As [`SimulatorImagingCI::via_layout_from`], with cosmic rays added to
    /// the charge before it is clocked.
    pub fn via_layout_with_cosmic_rays_from(
        &self,
        clocker: &Clocker2D,
        layout: &Layout2D,
        cti: &Cti2D,
        cosmic_ray_map: ArrayView2<f64>,
    ) -> Result<ImagingCI> {
        layout.check_shape(cosmic_ray_map.dim())?;
        self.simulate(clocker, layout, cti, Some(cosmic_ray_map))
    }

    /// Simulate one image per simulator, in parallel.
    pub fn simulate_list(
        simulators: &[SimulatorImagingCI],
        clocker: &Clocker2D,
        layout: &Layout2D,
        cti: &Cti2D,
    ) -> Result<Vec<ImagingCI>> {
        simulators
            .par_iter()
            .map(|simulator| simulator.via_layout_from(clocker, layout, cti))
            .collect()
    }

    fn simulate(
        &self,
        clocker: &Clocker2D,
        layout: &Layout2D,
        cti: &Cti2D,
        cosmic_ray_map: Option<ArrayView2<f64>>,
    ) -> Result<ImagingCI> {
        self.check()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let pre_cti_data = self.pre_cti_data_from(layout, &mut rng)?;

        let mut charge = pre_cti_data.clone();
        if let Some(cosmic_rays) = cosmic_ray_map {
            charge += &cosmic_rays;
        }
        let mut data = clocker.add_cti_via_layout(charge.view(), cti, layout)?;
        add_read_noise(&mut data, self.read_noise, &mut rng)?;
        log::info!(
            "Simulated charge injection image {:?}, norm {}, read noise {}",
            layout.shape(),
            self.norm,
            self.read_noise
        );

        Ok(ImagingCI {
            data,
            noise_map: Array2::from_elem(layout.shape(), self.read_noise),
            pre_cti_data,
            cosmic_ray_map: cosmic_ray_map.map(|map| map.to_owned()),
            layout: layout.clone(),
        })
    }

    fn check(&self) -> Result<()> {
        check_sigma("read noise", self.read_noise)?;
        if let Some(non_uniform) = self.non_uniform {
            check_sigma("column sigma", non_uniform.column_sigma)?;
        }
        Ok(())
    }

    fn pre_cti_data_from(&self, layout: &Layout2D, rng: &mut StdRng) -> Result<Array2<f64>> {
        let (Some(non_uniform), Some(first)) = (self.non_uniform, layout.region_list().first())
        else {
            return Ok(layout.pre_cti_data_uniform_from(self.norm));
        };
        let norms = non_uniform.injection_norm_list(self.norm, first.shape().1, rng)?;
        layout.pre_cti_data_non_uniform_from(&norms, non_uniform.row_slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocker::Roe;
    use crate::cti::CtiModelBuilder;
    use crate::extract::Extract2DKind;
    use crate::layout::Region2D;

    fn layout() -> Layout2D {
        Layout2D::new(
            (60, 14),
            vec![
                Region2D::new(5, 15, 2, 12).unwrap(),
                Region2D::new(30, 40, 2, 12).unwrap(),
            ],
        )
        .unwrap()
        .with_serial_prescan(Region2D::new(0, 60, 0, 2).unwrap())
        .unwrap()
    }

    fn cti() -> Cti2D {
        CtiModelBuilder::new()
            .parallel_trap(0.13, 1.25)
            .parallel_trap(0.25, 4.4)
            .parallel_ccd(0.0, 0.58, 200_000.0)
            .build_2d()
            .unwrap()
    }

    fn clocker() -> Clocker2D {
        Clocker2D::new(2, 2)
            .unwrap()
            .with_parallel_roe(Roe::charge_injection())
    }

    #[test]
    fn test_uniform_injection() {
        let simulator = SimulatorImagingCI {
            read_noise: 0.0,
            norm: 1_000.0,
            ..Default::default()
        };
        let imaging = simulator.via_layout_from(&clocker(), &layout(), &cti()).unwrap();
        assert_eq!(imaging.pre_cti_data[[10, 5]], 1_000.0);
        // The parallel EPER below each block holds released charge.
        assert!(imaging.data[[15, 5]] > 0.0);
        assert!(imaging.data[[5, 5]] < 1_000.0);
        assert!(imaging.cosmic_ray_map.is_none());
    }

    #[test]
    fn test_non_uniform_columns_differ() {
        let simulator = SimulatorImagingCI {
            read_noise: 0.0,
            norm: 1_000.0,
            non_uniform: Some(NonUniform {
                column_sigma: 100.0,
                row_slope: 0.0,
            }),
            ..Default::default()
        };
        let imaging = simulator.via_layout_from(&clocker(), &layout(), &cti()).unwrap();
        let pre = &imaging.pre_cti_data;
        assert_ne!(pre[[6, 3]], pre[[6, 4]]);
        // Both blocks share the same column pattern.
        assert_eq!(pre[[6, 3]], pre[[31, 3]]);

        let medians = layout()
            .extract(Extract2DKind::ParallelFpr)
            .median_list_from(pre.view(), (0, 10))
            .unwrap();
        assert_eq!(medians[1], pre[[6, 3]]);
    }

    #[test]
    fn test_cosmic_rays_are_clocked() {
        let simulator = SimulatorImagingCI {
            read_noise: 0.0,
            ..Default::default()
        };
        let mut cosmic_rays = Array2::zeros((60, 14));
        cosmic_rays[[50, 6]] = 20_000.0;
        let imaging = simulator
            .via_layout_with_cosmic_rays_from(&clocker(), &layout(), &cti(), cosmic_rays.view())
            .unwrap();
        assert!(imaging.data[[50, 6]] > 10_000.0);
        assert!(imaging.data[[51, 6]] > 0.0);
        assert_eq!(imaging.pre_cti_data[[50, 6]], 0.0);

        let wrong = Array2::zeros((10, 10));
        assert!(
            simulator
                .via_layout_with_cosmic_rays_from(&clocker(), &layout(), &cti(), wrong.view())
                .is_err()
        );
    }

    #[test]
    fn test_simulate_list_keeps_order() {
        let simulators: Vec<SimulatorImagingCI> = [100.0, 5_000.0, 25_000.0]
            .iter()
            .map(|&norm| SimulatorImagingCI {
                norm,
                ..Default::default()
            })
            .collect();
        let list =
            SimulatorImagingCI::simulate_list(&simulators, &clocker(), &layout(), &cti()).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2].pre_cti_data[[10, 5]], 25_000.0);
    }

    #[test]
    fn test_negative_widths_rejected() {
        let noisy = SimulatorImagingCI {
            read_noise: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            noisy.via_layout_from(&clocker(), &layout(), &cti()),
            Err(CtiError::InvalidSimulation(_))
        ));

        let scattered = SimulatorImagingCI {
            non_uniform: Some(NonUniform {
                column_sigma: -50.0,
                row_slope: 0.0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            scattered.via_layout_from(&clocker(), &layout(), &cti()),
            Err(CtiError::InvalidSimulation(_))
        ));

        let list = [SimulatorImagingCI::default(), noisy];
        assert!(SimulatorImagingCI::simulate_list(&list, &clocker(), &layout(), &cti()).is_err());
    }
}
