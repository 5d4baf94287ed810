//! Charge injection demo.
//!
//! Simulates charge injection images at several injection levels, corrects
//! them and reports how much trailed charge the correction puts back.
//!
//! Usage: cargo run --release -- [cti.json] [clocker.json]

use std::path::Path;
use std::process::ExitCode;

use ccd_cti::simulator::SimulatorImagingCI;
use ccd_cti::{Clocker2D, Cti2D, CtiModelBuilder, Extract2DKind, Layout2D, Region2D, Roe, io};
use ndarray::Array2;

const NORM_LIST: [f64; 4] = [100.0, 5_000.0, 25_000.0, 200_000.0];
const ITERATIONS: usize = 5;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> ccd_cti::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cti: Cti2D = match args.first() {
        Some(path) => io::from_json(Path::new(path))?,
        None => default_cti()?,
    };
    let clocker: Clocker2D = match args.get(1) {
        Some(path) => io::from_json(Path::new(path))?,
        None => Clocker2D::new(2, 2)?.with_parallel_roe(Roe::charge_injection()),
    };
    let layout = layout()?;

    println!("=== Charge injection CTI demo ===\n");
    println!(
        "Image {:?}, {} charge regions, parallel express {}, serial express {}\n",
        layout.shape(),
        layout.region_list().len(),
        clocker.parallel_express(),
        clocker.serial_express()
    );

    let simulators: Vec<SimulatorImagingCI> = NORM_LIST
        .iter()
        .map(|&norm| SimulatorImagingCI {
            norm,
            ..SimulatorImagingCI::default()
        })
        .collect();

    let start = web_time::Instant::now();
    let datasets = SimulatorImagingCI::simulate_list(&simulators, &clocker, &layout, &cti)?;
    let simulate_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!("Simulated {} images in {:.1}ms", datasets.len(), simulate_ms);

    let data_list: Vec<Array2<f64>> = datasets.iter().map(|d| d.data.clone()).collect();
    let start = web_time::Instant::now();
    let corrected_list = clocker.remove_cti_list(&data_list, &cti, ITERATIONS)?;
    let correct_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!("Corrected with {} iterations in {:.1}ms\n", ITERATIONS, correct_ms);

    let eper = layout.extract(Extract2DKind::ParallelEper);
    let fpr = layout.extract(Extract2DKind::ParallelFpr);
    for (dataset, corrected) in datasets.iter().zip(&corrected_list) {
        let eper_before = eper.binned_array_1d_from(dataset.data.view(), (0, 10))?.sum();
        let eper_after = eper.binned_array_1d_from(corrected.view(), (0, 10))?.sum();
        let fpr_before = fpr.binned_array_1d_from(dataset.data.view(), (0, 1))?[0];
        let fpr_after = fpr.binned_array_1d_from(corrected.view(), (0, 1))?[0];
        println!(
            "  norm={:>8.0}: first row {:>10.1} -> {:>10.1}   EPER sum {:>8.1} -> {:>6.1}",
            dataset.pre_cti_data.iter().cloned().fold(0.0, f64::max),
            fpr_before,
            fpr_after,
            eper_before,
            eper_after
        );
    }

    Ok(())
}

fn default_cti() -> ccd_cti::Result<Cti2D> {
    CtiModelBuilder::new()
        .parallel_trap(0.13, 1.25)
        .parallel_trap(0.25, 4.4)
        .parallel_ccd(0.0, 0.58, 200_000.0)
        .serial_trap(0.0442, 0.8)
        .serial_trap(0.1326, 4.0)
        .serial_ccd(0.0, 0.8, 84_700.0)
        .build_2d()
}

fn layout() -> ccd_cti::Result<Layout2D> {
    let region_list = (0..4)
        .map(|i| Region2D::new(20 + 100 * i, 60 + 100 * i, 5, 55))
        .collect::<ccd_cti::Result<Vec<_>>>()?;
    Layout2D::new((420, 60), region_list)?
        .with_parallel_overscan(Region2D::new(400, 420, 5, 55)?)?
        .with_serial_prescan(Region2D::new(0, 420, 0, 5)?)?
        .with_serial_overscan(Region2D::new(0, 400, 55, 60)?)
}
