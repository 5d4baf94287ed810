//! Express schedule.
//!
//! The transfers a pixel undergoes are grouped into batches of `express`
//! transfers. Each batch is simulated once with the trap capacity scaled by
//! the number of transfers it stands for. Pass `p` covers transfers
//! `p * express .. (p + 1) * express` of every pixel, so the weights of a
//! pixel over all passes sum to its transfer count.

use super::roe::RoeKind;
use crate::error::{CtiError, Result};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ExpressSchedule {
    express: usize,
    kind: RoeKind,
    offset: usize,
    length: usize,
}

impl ExpressSchedule {
    /// Schedule for a column of `length` pixels whose first pixel sits
    /// `offset` pixels away from the readout.
    pub(crate) fn new(express: usize, kind: RoeKind, offset: usize, length: usize) -> Result<Self> {
        if express == 0 {
            return Err(CtiError::InvalidExpress);
        }
        let schedule = Self {
            express,
            kind,
            offset,
            length,
        };
        let transfers = schedule.max_transfers();
        if express > transfers {
            return Err(CtiError::ExpressTooLarge { express, transfers });
        }
        Ok(schedule)
    }

    pub(crate) fn max_transfers(&self) -> usize {
        self.length + self.offset
    }

    /// Transfers pixel `index` undergoes before it reaches the readout.
    pub(crate) fn transfers(&self, index: usize) -> usize {
        match self.kind {
            RoeKind::Standard => index + 1 + self.offset,
            RoeKind::ChargeInjection => self.length + self.offset,
        }
    }

    pub(crate) fn n_passes(&self) -> usize {
        self.max_transfers().div_ceil(self.express)
    }

    /// Transfers pixel `index` stands for in pass `pass`.
    pub(crate) fn weight(&self, pass: usize, index: usize) -> usize {
        self.transfers(index)
            .saturating_sub(pass * self.express)
            .min(self.express)
    }
}
