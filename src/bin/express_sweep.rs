//! Express speed/accuracy sweep.
//!
//! Clocks the same 1D charge pattern with express 1 to 10 and reports the
//! run time and the trailed charge relative to the exact express 1 result.
//!
//! Usage: cargo run --release --bin express_sweep

use std::process::ExitCode;

use ccd_cti::{Clocker1D, CtiModelBuilder, Extract1DKind, Layout1D, Region1D};

const MAX_EXPRESS: usize = 10;
const EPER_PIXELS: (i64, i64) = (0, 50);

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
    let region_list = [(100, 200), (400, 500), (700, 800)]
        .iter()
        .map(|&(x0, x1)| Region1D::new(x0, x1))
        .collect::<ccd_cti::Result<Vec<_>>>()?;
    let layout = Layout1D::new(
        1000,
        region_list,
        Some(Region1D::new(0, 10)?),
        Some(Region1D::new(950, 1000)?),
    )?;
    let cti = CtiModelBuilder::new()
        .trap(0.13, 1.25)
        .trap(0.25, 4.4)
        .ccd(0.0, 0.58, 200_000.0)
        .build_1d()?;
    let pre_cti_data = layout.pre_cti_data_from(1_000.0);
    let eper = layout.extract(Extract1DKind::Eper);

    println!("=== Express sweep ({} pixels) ===\n", layout.shape());
    println!("{:>8} {:>10} {:>14} {:>12}", "express", "time (ms)", "EPER charge", "rel. diff");

    let mut exact = None;
    for express in 1..=MAX_EXPRESS {
        let clocker = Clocker1D::new(express)?;
        let start = web_time::Instant::now();
        let data = clocker.add_cti_via_layout(pre_cti_data.view(), &cti, &layout)?;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        let trailed = eper.stacked_array_from(data.view(), EPER_PIXELS)?.sum();
        let reference = *exact.get_or_insert(trailed);
        let rel = (trailed - reference) / reference;
        println!("{:>8} {:>10.2} {:>14.3} {:>11.4}%", express, ms, trailed, rel * 100.0);
    }

    Ok(())
}
