use std::fmt;

use ndarray::{Ix2, SliceInfo, SliceInfoElem, s};

use crate::error::{CtiError, Result};

/// Half-open pixel range `[x0, x1)` of a 1D array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region1D {
    x0: usize,
    x1: usize,
}

impl Region1D {
    pub fn new(x0: usize, x1: usize) -> Result<Self> {
        if x0 >= x1 {
            return Err(CtiError::InvalidRegion(format!(
                "({x0}, {x1}) is empty or reversed"
            )));
        }
        Ok(Self { x0, x1 })
    }

    /// Region `[start, end)` from signed bounds, failing when it would start
    /// before pixel 0.
    pub(crate) fn from_signed(start: i64, end: i64, shape: usize) -> Result<Self> {
        if start < 0 || end as i128 > shape as i128 {
            return Err(CtiError::RegionOutOfBounds {
                region: format!("({start}, {end})"),
                shape: vec![shape],
            });
        }
        Region1D::new(start as usize, end as usize)
    }

    pub fn x0(&self) -> usize {
        self.x0
    }

    pub fn x1(&self) -> usize {
        self.x1
    }

    pub fn total_pixels(&self) -> usize {
        self.x1 - self.x0
    }

    pub(crate) fn fits(&self, shape: usize) -> bool {
        self.x1 <= shape
    }
}

impl fmt::Display for Region1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x0, self.x1)
    }
}

/// Half-open rectangle `(y0, y1, x0, x1)`: rows `[y0, y1)`, columns
/// `[x0, x1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region2D {
    y0: usize,
    y1: usize,
    x0: usize,
    x1: usize,
}

impl Region2D {
    pub fn new(y0: usize, y1: usize, x0: usize, x1: usize) -> Result<Self> {
        if y0 >= y1 || x0 >= x1 {
            return Err(CtiError::InvalidRegion(format!(
                "({y0}, {y1}, {x0}, {x1}) is empty or reversed"
            )));
        }
        Ok(Self { y0, y1, x0, x1 })
    }

    pub(crate) fn from_signed(
        y0: i64,
        y1: i64,
        x0: i64,
        x1: i64,
        shape: (usize, usize),
    ) -> Result<Self> {
        if y0 < 0 || x0 < 0 || y1 as i128 > shape.0 as i128 || x1 as i128 > shape.1 as i128 {
            return Err(CtiError::RegionOutOfBounds {
                region: format!("({y0}, {y1}, {x0}, {x1})"),
                shape: vec![shape.0, shape.1],
            });
        }
        Region2D::new(y0 as usize, y1 as usize, x0 as usize, x1 as usize)
    }

    pub fn y0(&self) -> usize {
        self.y0
    }

    pub fn y1(&self) -> usize {
        self.y1
    }

    pub fn x0(&self) -> usize {
        self.x0
    }

    pub fn x1(&self) -> usize {
        self.x1
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.y1 - self.y0, self.x1 - self.x0)
    }

    pub fn total_pixels(&self) -> usize {
        let (rows, cols) = self.shape();
        rows * cols
    }

    pub(crate) fn fits(&self, shape: (usize, usize)) -> bool {
        self.y1 <= shape.0 && self.x1 <= shape.1
    }

    pub(crate) fn slice(&self) -> SliceInfo<[SliceInfoElem; 2], Ix2, Ix2> {
        s![self.y0..self.y1, self.x0..self.x1]
    }

    /// The same pixels after the array is flipped top to bottom.
    pub(crate) fn flip_rows(&self, rows: usize) -> Self {
        Self {
            y0: rows - self.y1,
            y1: rows - self.y0,
            ..*self
        }
    }

    /// The same pixels after the array is flipped left to right.
    pub(crate) fn flip_cols(&self, cols: usize) -> Self {
        Self {
            x0: cols - self.x1,
            x1: cols - self.x0,
            ..*self
        }
    }
}

impl fmt::Display for Region2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.y0, self.y1, self.x0, self.x1)
    }
}
