//! Hardware Abstraction Layer
//!
//! - [`poll`]: bounded polling of status bits
//! - [`reset`]: controller-wide functional reset
//!
//! # Delay Integration
//!
//! All waits use `embedded_hal::delay::DelayNs`. Pass any delay
//! implementation from your HAL.

pub mod poll;
pub mod reset;

pub use poll::poll_until;
pub use reset::ResetController;
