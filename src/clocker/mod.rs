//! Forward CTI model and its iterative inverse.
//!
//! Charge is clocked pixel by pixel towards the readout at index 0. Every
//! pass over a column walks the traps behind the leading charge packet, so the
//! electrons a packet loses are released into the packets that follow it
//! (the EPER trail).

mod column;
mod correction;
mod express;
mod one_d;
mod roe;
mod two_d;

pub use one_d::Clocker1D;
pub use roe::{Roe, RoeKind};
pub use two_d::Clocker2D;
