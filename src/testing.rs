//! Testing utilities and mock implementations
//!
//! A register-level model of the controller plus the usual delay and
//! callback doubles, so the driver can be exercised on the host.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use crate::driver::transfer::{Completion, Cookie, TransferCallback};
use crate::internal::register::RegisterBus;
use crate::internal::register::channel::*;
use crate::internal::register::global::{CHAN_SELECT_OFFSET, IRQ_CAUSE_OFFSET};
use crate::internal::register::port::{PORT_CTRL_OFFSET, PORT_SELECT_OFFSET};

// =============================================================================
// Mock Register Block
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    global: HashMap<usize, u32>,
    channels: HashMap<(u8, usize), u32>,
    ports: HashMap<u8, u32>,
    chan_select: u8,
    port_select: u8,
    tx_channels: u32,
    stuck_enable: u32,
    stuck_reset: u32,
    fetch_pending: u32,
    writes: Vec<(usize, u32)>,
}

impl MockState {
    fn read_channel(&self, ch: u8, offset: usize) -> u32 {
        let stored = self.channels.get(&(ch, offset)).copied().unwrap_or(0);
        let bit = 1u32 << ch;
        match offset {
            CH_CTRL_OFFSET => {
                let dir = if self.tx_channels & bit != 0 { CH_CTRL_DIR_TX } else { 0 };
                (stored & !CH_CTRL_DIR_TX) | dir
            }
            CH_STATUS_OFFSET => {
                let ctrl = self.channels.get(&(ch, CH_CTRL_OFFSET)).copied().unwrap_or(0);
                let mut status = 0;
                if ctrl & CH_CTRL_ENABLE != 0 || self.stuck_enable & bit != 0 {
                    status |= CH_STATUS_ENABLED;
                }
                if self.fetch_pending & bit != 0 {
                    status |= CH_STATUS_FETCH_PENDING;
                }
                status
            }
            _ => stored,
        }
    }

    fn write_channel(&mut self, ch: u8, offset: usize, value: u32) {
        let bit = 1u32 << ch;
        match offset {
            CH_STATUS_OFFSET | CH_HEAD_OFFSET => {}
            CH_IRQ_CAUSE_OFFSET => {
                let slot = self.channels.entry((ch, offset)).or_insert(0);
                *slot &= !value;
            }
            CH_CTRL_OFFSET => {
                let mut value = value & !CH_CTRL_DIR_TX;
                if self.stuck_reset & bit == 0 {
                    value &= !CH_CTRL_RESET;
                }
                self.channels.insert((ch, offset), value);
            }
            _ => {
                self.channels.insert((ch, offset), value);
            }
        }
    }
}

/// Register-level model of the DMA controller
///
/// Clones share the same state, so a test keeps one handle for inspection
/// and gives another to the driver.
///
/// Modelled behaviour:
/// - channel and port windows follow the select registers
/// - cause registers are write-1-to-clear
/// - the channel reset bit self-clears unless marked stuck
/// - the status enable bit mirrors the control enable bit unless marked stuck
/// - the direction bit is read-only and comes from [`set_tx_channels`](Self::set_tx_channels)
#[derive(Debug, Clone, Default)]
pub struct MockHardware {
    state: Rc<RefCell<MockState>>,
}

impl MockHardware {
    /// Create a register block with every register zero and all channels RX
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels whose direction bit reads as TX
    pub fn set_tx_channels(&self, mask: u32) {
        self.state.borrow_mut().tx_channels = mask;
    }

    /// Keep the status enable bit set regardless of the control register
    pub fn set_stuck_enable(&self, ch: u8, stuck: bool) {
        let mut s = self.state.borrow_mut();
        if stuck {
            s.stuck_enable |= 1 << ch;
        } else {
            s.stuck_enable &= !(1 << ch);
        }
    }

    /// Keep the channel reset bit set once written
    pub fn set_stuck_reset(&self, ch: u8, stuck: bool) {
        let mut s = self.state.borrow_mut();
        if stuck {
            s.stuck_reset |= 1 << ch;
        } else {
            s.stuck_reset &= !(1 << ch);
        }
    }

    /// Report an unacknowledged descriptor fetch on `ch`
    pub fn set_fetch_pending(&self, ch: u8, pending: bool) {
        let mut s = self.state.borrow_mut();
        if pending {
            s.fetch_pending |= 1 << ch;
        } else {
            s.fetch_pending &= !(1 << ch);
        }
    }

    /// Raise a completion interrupt for `ch` in both cause registers
    pub fn raise_channel_irq(&self, ch: u8) {
        let mut s = self.state.borrow_mut();
        *s.global.entry(IRQ_CAUSE_OFFSET).or_insert(0) |= 1 << ch;
        *s.channels.entry((ch, CH_IRQ_CAUSE_OFFSET)).or_insert(0) |= CH_IRQ_COMPLETE;
    }

    /// Value of a global register
    pub fn global_reg(&self, offset: usize) -> u32 {
        self.state.borrow().global.get(&offset).copied().unwrap_or(0)
    }

    /// Set a global register without write side effects
    pub fn set_global_reg(&self, offset: usize, value: u32) {
        self.state.borrow_mut().global.insert(offset, value);
    }

    /// Value of a channel register as the driver would read it
    pub fn channel_reg(&self, ch: u8, offset: usize) -> u32 {
        self.state.borrow().read_channel(ch, offset)
    }

    /// Set a channel register without write side effects
    pub fn set_channel_reg(&self, ch: u8, offset: usize, value: u32) {
        self.state.borrow_mut().channels.insert((ch, offset), value);
    }

    /// Value of a port control register
    pub fn port_reg(&self, port: u8) -> u32 {
        self.state.borrow().ports.get(&port).copied().unwrap_or(0)
    }

    /// Every write made so far, as (offset, value)
    pub fn write_log(&self) -> Vec<(usize, u32)> {
        self.state.borrow().writes.clone()
    }

    /// Number of writes made so far
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    /// Forget recorded writes
    pub fn clear_write_log(&self) {
        self.state.borrow_mut().writes.clear();
    }
}

impl RegisterBus for MockHardware {
    fn read(&mut self, offset: usize) -> u32 {
        let s = self.state.borrow();
        match offset {
            CHAN_SELECT_OFFSET => u32::from(s.chan_select),
            PORT_SELECT_OFFSET => u32::from(s.port_select),
            PORT_CTRL_OFFSET => s.ports.get(&s.port_select).copied().unwrap_or(0),
            o if is_channel_register(o) => s.read_channel(s.chan_select, o),
            o => s.global.get(&o).copied().unwrap_or(0),
        }
    }

    fn write(&mut self, offset: usize, value: u32) {
        let mut s = self.state.borrow_mut();
        s.writes.push((offset, value));
        match offset {
            CHAN_SELECT_OFFSET => s.chan_select = value as u8,
            PORT_SELECT_OFFSET => s.port_select = value as u8,
            PORT_CTRL_OFFSET => {
                let port = s.port_select;
                s.ports.insert(port, value);
            }
            IRQ_CAUSE_OFFSET => {
                *s.global.entry(offset).or_insert(0) &= !value;
            }
            o if is_channel_register(o) => {
                let ch = s.chan_select;
                s.write_channel(ch, o, value);
            }
            o => {
                s.global.insert(o, value);
            }
        }
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Delay provider that only adds up the requested time
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }

    /// Reset the delay counter
    pub fn reset(&self) {
        *self.total_ns.borrow_mut() = 0;
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

// =============================================================================
// Recording Callback
// =============================================================================

/// Completion callback that records every call in order
#[derive(Debug, Default)]
pub struct RecordingCallback {
    calls: RefCell<Vec<Completion>>,
}

impl RecordingCallback {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every completion seen so far
    pub fn calls(&self) -> Vec<Completion> {
        self.calls.borrow().clone()
    }

    /// Cookies of every completion, in call order
    pub fn cookies(&self) -> Vec<Cookie> {
        self.calls.borrow().iter().map(|c| c.cookie).collect()
    }

    /// Number of completions seen
    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl TransferCallback for RecordingCallback {
    fn on_complete(&self, completion: Completion) {
        self.calls.borrow_mut().push(completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn channel_window_follows_select() {
        let mut hw = MockHardware::new();
        hw.write(CHAN_SELECT_OFFSET, 2);
        hw.write(CH_POLL_OFFSET, 7);
        hw.write(CHAN_SELECT_OFFSET, 3);
        assert_eq!(hw.read(CH_POLL_OFFSET), 0);
        assert_eq!(hw.channel_reg(2, CH_POLL_OFFSET), 7);
    }

    #[test]
    fn reset_bit_self_clears_unless_stuck() {
        let mut hw = MockHardware::new();
        hw.write(CHAN_SELECT_OFFSET, 1);
        hw.write(CH_CTRL_OFFSET, CH_CTRL_RESET);
        assert_eq!(hw.read(CH_CTRL_OFFSET) & CH_CTRL_RESET, 0);

        hw.set_stuck_reset(1, true);
        hw.write(CH_CTRL_OFFSET, CH_CTRL_RESET);
        assert_ne!(hw.read(CH_CTRL_OFFSET) & CH_CTRL_RESET, 0);
    }

    #[test]
    fn status_mirrors_enable() {
        let mut hw = MockHardware::new();
        hw.write(CHAN_SELECT_OFFSET, 0);
        hw.write(CH_CTRL_OFFSET, CH_CTRL_ENABLE);
        assert_eq!(hw.read(CH_STATUS_OFFSET), CH_STATUS_ENABLED);
        hw.write(CH_CTRL_OFFSET, 0);
        assert_eq!(hw.read(CH_STATUS_OFFSET), 0);
        hw.set_stuck_enable(0, true);
        assert_eq!(hw.read(CH_STATUS_OFFSET), CH_STATUS_ENABLED);
    }

    #[test]
    fn cause_registers_are_write_one_to_clear() {
        let mut hw = MockHardware::new();
        hw.raise_channel_irq(4);
        hw.raise_channel_irq(6);
        hw.write(IRQ_CAUSE_OFFSET, 1 << 4);
        assert_eq!(hw.global_reg(IRQ_CAUSE_OFFSET), 1 << 6);
    }

    #[test]
    fn mock_delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_us(10);
        delay.delay_ns(500);
        assert_eq!(delay.total_ns(), 10_500);
        assert_eq!(delay.total_us(), 10);
    }
}
