//! CCD charge transfer inefficiency (CTI) - library crate.
//!
//! Clocks pixel arrays through trap capture and release (`add_cti`), undoes
//! it iteratively (`remove_cti`), and provides the layout geometry,
//! extraction, simulation and preparation used around those two calls.

pub mod ccd;
pub mod clocker;
pub mod cti;
pub mod error;
pub mod extract;
pub mod io;
pub mod layout;
pub mod preparation;
pub mod simulator;
pub mod traps;

pub use ccd::CcdVolume;
pub use clocker::{Clocker1D, Clocker2D, Roe, RoeKind};
pub use cti::{Cti1D, Cti2D, CtiDirection, CtiModelBuilder};
pub use error::{CtiError, Result};
pub use extract::{Extract1DKind, Extract2DKind};
pub use layout::{Layout1D, Layout2D, ReadoutCorner, Region1D, Region2D};
pub use traps::{Capture, TrapSpecies};
