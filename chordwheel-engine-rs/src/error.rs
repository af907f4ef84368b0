//! Error types at the collaborator boundary.
//!
//! Neither error ever reaches the button state machine or the scale/chord
//! engine: transient faults are absorbed by the [`Sampler`](crate::Sampler)
//! and a [`BusFault`] ends the controller's life (panic, then restart).
//! Musical parameters have no error path at all: every change wraps.

use core::fmt;

/// A single failed hardware read (one bus glitch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransientIoError;

/// Bus recovery failed; the device must restart rather than keep running
/// on a known-bad bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusFault;

impl fmt::Display for TransientIoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "transient I/O error")
    }
}

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bus fault: recovery failed")
    }
}
