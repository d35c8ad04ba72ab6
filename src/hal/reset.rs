//! Reset Controller HAL
//!
//! Drives the controller-wide functional reset line used during bring-up.

use embedded_hal::delay::DelayNs;

use crate::internal::constants::{RESET_ASSERT_US, RESET_RELEASE_US};
use crate::internal::register::global::{RESET_FUNC, RESET_OFFSET};
use crate::internal::register::{DmaRegisters, RegisterBus};

/// Functional reset of the whole controller
///
/// Unlike a channel reset there is no completion bit to poll: the line is
/// held for a fixed time and the controller is ready a fixed time after
/// release.
pub struct ResetController<'a, B: RegisterBus> {
    regs: &'a DmaRegisters<B>,
    assert_us: u32,
    release_us: u32,
}

impl<'a, B: RegisterBus> ResetController<'a, B> {
    /// Create a reset controller with the default hold and settle times
    pub fn new(regs: &'a DmaRegisters<B>) -> Self {
        Self {
            regs,
            assert_us: RESET_ASSERT_US,
            release_us: RESET_RELEASE_US,
        }
    }

    /// Create a reset controller with custom hold and settle times
    pub fn with_timing(regs: &'a DmaRegisters<B>, assert_us: u32, release_us: u32) -> Self {
        Self {
            regs,
            assert_us,
            release_us,
        }
    }

    /// Assert the reset line, wait, release it, and wait for the controller
    /// to settle
    pub fn functional_reset<D: DelayNs>(&self, delay: &mut D) {
        self.regs.set_bits(RESET_OFFSET, RESET_FUNC);
        delay.delay_us(self.assert_us);
        self.regs.clear_bits(RESET_OFFSET, RESET_FUNC);
        delay.delay_us(self.release_us);
    }

    /// Check if the reset line is currently asserted
    pub fn is_reset_asserted(&self) -> bool {
        (self.regs.read(RESET_OFFSET) & RESET_FUNC) != 0
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{MockDelay, MockHardware};

    #[test]
    fn functional_reset_asserts_then_releases() {
        let hw = MockHardware::new();
        let regs = DmaRegisters::new(hw.clone());
        let mut delay = MockDelay::new();

        ResetController::new(&regs).functional_reset(&mut delay);

        let writes: std::vec::Vec<u32> = hw
            .write_log()
            .into_iter()
            .filter(|(off, _)| *off == RESET_OFFSET)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(writes, [RESET_FUNC, 0]);
        assert_eq!(delay.total_us(), u64::from(RESET_ASSERT_US + RESET_RELEASE_US));
        assert!(!ResetController::new(&regs).is_reset_asserted());
    }

    #[test]
    fn custom_timing_is_honoured() {
        let hw = MockHardware::new();
        let regs = DmaRegisters::new(hw);
        let mut delay = MockDelay::new();

        ResetController::with_timing(&regs, 100, 50).functional_reset(&mut delay);
        assert_eq!(delay.total_us(), 150);
    }
}
