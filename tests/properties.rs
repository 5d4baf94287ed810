use approx::assert_relative_eq;
use ccd_cti::{
    Clocker1D, Clocker2D, Cti1D, Cti2D, CtiModelBuilder, Extract1DKind, Extract2DKind, Layout1D,
    Layout2D, Region1D, Region2D, Roe,
};
use ndarray::{Array1, Array2, s};

fn cti_1d(density: f64) -> Cti1D {
    CtiModelBuilder::new()
        .trap(density, 1.25)
        .ccd(0.0, 0.58, 200_000.0)
        .build_1d()
        .unwrap()
}

fn cti_2d() -> Cti2D {
    CtiModelBuilder::new()
        .parallel_trap(0.13, 1.25)
        .parallel_trap(0.25, 4.4)
        .parallel_ccd(0.0, 0.58, 200_000.0)
        .serial_trap(0.0442, 0.8)
        .serial_trap(0.1326, 4.0)
        .serial_ccd(0.0, 0.8, 84_700.0)
        .build_2d()
        .unwrap()
}

/// 200 pixels, FPR at [10, 20) holding `norm`, zero elsewhere.
fn scenario(norm: f64) -> (Layout1D, Array1<f64>) {
    let layout = Layout1D::new(
        200,
        vec![Region1D::new(10, 20).unwrap()],
        Some(Region1D::new(0, 10).unwrap()),
        Some(Region1D::new(190, 200).unwrap()),
    )
    .unwrap();
    let data = layout.pre_cti_data_from(norm);
    (layout, data)
}

fn ci_layout() -> Layout2D {
    Layout2D::new(
        (80, 16),
        vec![
            Region2D::new(5, 20, 3, 13).unwrap(),
            Region2D::new(40, 55, 3, 13).unwrap(),
        ],
    )
    .unwrap()
    .with_parallel_overscan(Region2D::new(70, 80, 3, 13).unwrap())
    .unwrap()
    .with_serial_prescan(Region2D::new(0, 80, 0, 3).unwrap())
    .unwrap()
}

#[test]
fn shape_is_preserved() {
    let (_, data) = scenario(100.0);
    for express in [1, 4, 10] {
        let out = Clocker1D::new(express)
            .unwrap()
            .add_cti(data.view(), &cti_1d(0.13))
            .unwrap();
        assert_eq!(out.dim(), data.dim());
    }

    let image = ci_layout().pre_cti_data_uniform_from(1_000.0);
    let out = Clocker2D::new(3, 3)
        .unwrap()
        .add_cti(image.view(), &cti_2d())
        .unwrap();
    assert_eq!(out.dim(), image.dim());
}

#[test]
fn zero_density_is_exact_identity() {
    let (_, data) = scenario(100.0);
    let out = Clocker1D::new(2)
        .unwrap()
        .add_cti(data.view(), &cti_1d(0.0))
        .unwrap();
    assert_eq!(out, data);

    let trap_free = CtiModelBuilder::new()
        .parallel_trap(0.0, 1.25)
        .parallel_ccd(0.0, 0.58, 200_000.0)
        .build_2d()
        .unwrap();
    let image = ci_layout().pre_cti_data_uniform_from(1_000.0);
    let out = Clocker2D::default().add_cti(image.view(), &trap_free).unwrap();
    assert_eq!(out, image);
}

#[test]
fn charge_is_conserved_away_from_the_array_end() {
    // Long run of empty pixels after the charge: every trapped electron is
    // released before the end of the array.
    let (_, data) = scenario(100.0);
    for express in [1, 5] {
        let out = Clocker1D::new(express)
            .unwrap()
            .add_cti(data.view(), &cti_1d(0.13))
            .unwrap();
        assert_relative_eq!(out.sum(), data.sum(), max_relative = 1e-9);
    }

    let mut image = Array2::zeros((120, 120));
    image.slice_mut(s![5..15, 5..15]).fill(2_000.0);
    let out = Clocker2D::new(1, 1)
        .unwrap()
        .add_cti(image.view(), &cti_2d())
        .unwrap();
    assert_relative_eq!(out.sum(), image.sum(), max_relative = 1e-9);
}

#[test]
fn correction_residual_shrinks_with_iterations() {
    let (_, data) = scenario(1_000.0);
    let clocker = Clocker1D::new(1).unwrap();
    let cti = cti_1d(2.0);
    let observed = clocker.add_cti(data.view(), &cti).unwrap();

    let residuals: Vec<f64> = (1..=5)
        .map(|iterations| {
            let corrected = clocker.remove_cti(observed.view(), &cti, iterations).unwrap();
            let remodelled = clocker.add_cti(corrected.view(), &cti).unwrap();
            (&remodelled - &observed).iter().fold(0.0, |m: f64, r| m.max(r.abs()))
        })
        .collect();

    for pair in residuals.windows(2) {
        assert!(pair[1] < pair[0] || pair[1] < 1e-9, "{residuals:?}");
    }
    assert!(residuals[4] < residuals[0]);
}

#[test]
fn express_agrees_with_exact_clocking() {
    let (_, data) = scenario(100.0);
    let cti = cti_1d(0.13);
    let trailed = |express: usize| {
        let out = Clocker1D::new(express)
            .unwrap()
            .add_cti(data.view(), &cti)
            .unwrap();
        out.slice(s![20..200]).sum()
    };

    let exact = trailed(1);
    assert!(exact > 0.0);
    for express in [2, 5, 10] {
        let approx = trailed(express);
        assert!(
            ((approx - exact) / exact).abs() < 0.01,
            "express {express}: {approx} vs {exact}"
        );
    }
}

#[test]
fn extraction_counts_match_regions() {
    let layout = Layout1D::new(
        300,
        vec![
            Region1D::new(10, 40).unwrap(),
            Region1D::new(100, 130).unwrap(),
            Region1D::new(200, 230).unwrap(),
        ],
        None,
        None,
    )
    .unwrap();
    for kind in [Extract1DKind::Fpr, Extract1DKind::Eper] {
        let regions = layout.extract(kind).region_list_from((0, 10)).unwrap();
        let total: usize = regions.iter().map(|r| r.total_pixels()).sum();
        assert_eq!(total, 10 * layout.region_list().len());
    }

    let layout = ci_layout();
    let image = layout.pre_cti_data_uniform_from(1_000.0);
    let stacked = layout
        .extract(Extract2DKind::ParallelFpr)
        .stacked_array_from(image.view(), (0, 10))
        .unwrap();
    assert_eq!(stacked.dim(), (10, 10));
    assert_ne!(stacked.dim(), image.dim());
}

#[test]
fn concrete_fpr_scenario() {
    let (layout, data) = scenario(100.0);
    let out = Clocker1D::new(1)
        .unwrap()
        .add_cti_via_layout(data.view(), &cti_1d(0.13), &layout)
        .unwrap();

    assert!(out.slice(s![0..10]).iter().all(|&v| v == 0.0));
    for &v in out.slice(s![10..20]).iter() {
        assert!(v < 100.0);
        assert!(v > 99.0);
    }
    let eper = layout
        .extract(Extract1DKind::Eper)
        .array_list_from(out.view(), (0, 10))
        .unwrap()
        .remove(0);
    for i in 0..eper.len() {
        assert!(eper[i] > 0.0);
        if i > 0 {
            assert!(eper[i] < eper[i - 1]);
        }
    }
}

#[test]
fn charge_injection_fast_mode_is_exact() {
    let layout = ci_layout();
    let image = layout.pre_cti_data_uniform_from(5_000.0);
    let fast = Clocker2D::new(2, 2)
        .unwrap()
        .with_parallel_roe(Roe::charge_injection());
    let slow = fast
        .clone()
        .with_parallel_roe(Roe::charge_injection().with_fast_mode(false));
    assert_eq!(
        fast.add_cti(image.view(), &cti_2d()).unwrap(),
        slow.add_cti(image.view(), &cti_2d()).unwrap()
    );
}
