//! Cross-thread signalling.
//!
//! [`SharedMonitor`] is the "context ready" latch the widget-init thread parks
//! on. Waits are always paired with an [`Interrupt`] so a parked thread can be
//! cancelled without a timeout.

mod monitor;

pub use monitor::{Interrupt, SharedMonitor, WaitError};
