//! Array geometry: where the charge regions, prescans and overscans sit, and
//! which corner of the array is read out.

mod one_d;
mod region;
mod two_d;

pub use one_d::Layout1D;
pub use region::{Region1D, Region2D};
pub use two_d::Layout2D;

/// Corner of a 2D array nearest the readout amplifier.
///
/// Clocking always moves charge towards `(0, 0)`, so images read out from any
/// other corner are flipped into that frame first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadoutCorner {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ReadoutCorner {
    pub const ALL: &[ReadoutCorner] = &[
        ReadoutCorner::TopLeft,
        ReadoutCorner::TopRight,
        ReadoutCorner::BottomLeft,
        ReadoutCorner::BottomRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReadoutCorner::TopLeft => "Top left",
            ReadoutCorner::TopRight => "Top right",
            ReadoutCorner::BottomLeft => "Bottom left",
            ReadoutCorner::BottomRight => "Bottom right",
        }
    }

    pub(crate) fn flips_rows(&self) -> bool {
        matches!(self, ReadoutCorner::BottomLeft | ReadoutCorner::BottomRight)
    }

    pub(crate) fn flips_cols(&self) -> bool {
        matches!(self, ReadoutCorner::TopRight | ReadoutCorner::BottomRight)
    }
}
