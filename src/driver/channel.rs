//! Channel Controller
//!
//! One hardware DMA channel and its state machine:
//!
//! ```text
//! Unconfigured --configure--> Off --turn_on--> On
//!                              ^  <--turn_off--
//!                              |
//!                              +--reset--> Resetting --> Off
//! ```
//!
//! Every register access goes through [`DmaRegisters::with_channel`], so the
//! channel select and the access happen under one critical section. Status
//! polls reselect the channel on each iteration instead of holding the lock.

#[cfg(feature = "log")]
use log::warn;

use embedded_hal::delay::DelayNs;

use crate::driver::capability::{Capabilities, InstanceKind};
use crate::driver::config::{ChannelConfig, DescriptorBase, HeaderMode, PollTicks, SwapType};
use crate::driver::error::{ConfigError, DmaError, IoError, Result};
use crate::hal::poll::poll_until;
use crate::internal::constants::{CHANNEL_POLL_TIMEOUT_US, MAX_CLASS, POLL_INTERVAL_US};
use crate::internal::register::channel::*;
use crate::internal::register::{DmaRegisters, RegisterBus};

// =============================================================================
// Types
// =============================================================================

/// Channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Not yet configured
    #[default]
    Unconfigured,
    /// Configured and stopped
    Off,
    /// Running
    On,
    /// Reset issued and not yet confirmed
    Resetting,
}

/// Transfer direction, fixed in silicon per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory to peripheral
    #[default]
    Tx,
    /// Peripheral to memory
    Rx,
}

/// One tunable channel setting
///
/// Configure-time application and the explicit runtime setters share the
/// same handler, selected by matching on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelOption {
    /// Class/priority (0..=31)
    Class(u8),
    /// Polling tick pair; `None` disables polling
    PollTicks(Option<PollTicks>),
    /// Byte offset length (RX only); 0 disables
    ByteOffset(u8),
    /// Data endian swap
    DataSwap(Option<SwapType>),
    /// Descriptor endian swap
    DescSwap(Option<SwapType>),
    /// Header mode (RX only)
    Header(Option<HeaderMode>),
    /// Non-posted writes (RX only)
    WriteNonPosted(bool),
    /// Adaptive burst chop (TX only)
    AdaptiveChop(bool),
}

/// How to treat an option the channel cannot take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Apply {
    /// Skip silently (bring-up path)
    Lenient,
    /// Report an error (explicit setter)
    Strict,
}

/// Snapshot of a channel's register window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelRegisterDump {
    /// Channel number
    pub channel: u8,
    /// CH_CTRL
    pub ctrl: u32,
    /// CH_STATUS
    pub status: u32,
    /// CH_DESC_BASE_LO
    pub desc_base_lo: u32,
    /// CH_DESC_BASE_HI
    pub desc_base_hi: u32,
    /// CH_DESC_COUNT
    pub desc_count: u32,
    /// CH_IRQ_ENABLE
    pub irq_enable: u32,
    /// CH_IRQ_CAUSE
    pub irq_cause: u32,
    /// CH_POLL
    pub poll: u32,
    /// CH_CFG
    pub cfg: u32,
    /// CH_HDR
    pub hdr: u32,
    /// CH_TAIL
    pub tail: u32,
    /// CH_HEAD
    pub head: u32,
}

fn gate(mode: Apply, allowed: bool, err: ConfigError) -> Result<bool> {
    match (allowed, mode) {
        (true, _) => Ok(true),
        (false, Apply::Lenient) => Ok(false),
        (false, Apply::Strict) => Err(err.into()),
    }
}

// =============================================================================
// Channel
// =============================================================================

/// One hardware DMA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    index: u8,
    port: u8,
    state: ChannelState,
    direction: Direction,
    desc_init: bool,
    desc_base: u64,
    desc_count: u16,
    hw_supplied: bool,
    reset_done: bool,
}

impl Channel {
    /// Create an unconfigured channel
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            port: 0,
            state: ChannelState::Unconfigured,
            direction: Direction::Tx,
            desc_init: false,
            desc_base: 0,
            desc_count: 0,
            hw_supplied: false,
            reset_done: false,
        }
    }

    /// Channel number
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Owning port index
    pub const fn port(&self) -> u8 {
        self.port
    }

    /// Current state
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// Direction read from hardware at configure time
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// True once a descriptor base has been programmed
    pub const fn desc_init(&self) -> bool {
        self.desc_init
    }

    /// Programmed descriptor base and count
    pub const fn descriptor_base(&self) -> Option<DescriptorBase> {
        if self.desc_init {
            Some(DescriptorBase::new(self.desc_base, self.desc_count))
        } else {
            None
        }
    }

    /// True if the descriptor base came from the device configuration
    pub const fn is_hw_supplied(&self) -> bool {
        self.hw_supplied
    }

    /// True if the last reset completed and no descriptors have been set since
    pub const fn was_reset(&self) -> bool {
        self.reset_done
    }

    /// True while the channel is running
    pub const fn is_on(&self) -> bool {
        matches!(self.state, ChannelState::On)
    }

    // =========================================================================
    // Configure
    // =========================================================================

    /// Bring the channel from `Unconfigured` (or any stopped state) to `Off`
    ///
    /// Reads the direction from hardware, applies the caller's control bits
    /// while preserving the class field, resets interrupt masking, and on
    /// revisions with channel tuning applies each tuning option. Options
    /// the channel cannot take are skipped silently.
    pub fn configure<B: RegisterBus>(
        &mut self,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        config: &ChannelConfig,
    ) -> Result<()> {
        let mut irq_mask = CH_IRQ_COMPLETE | CH_IRQ_ERROR;
        if caps.descriptor_timeout {
            irq_mask |= CH_IRQ_DESC_TIMEOUT;
        }

        let ctrl = regs.with_channel(self.index, |w| {
            let ctrl = w.ctrl();
            w.update_bits(CH_CTRL_OFFSET, CH_CTRL_USER_MASK, config.control.to_bits());
            w.set_irq_enable(0);
            w.set_irq_cause(CH_IRQ_ALL);
            w.set_irq_enable(irq_mask);
            ctrl
        });
        self.direction = if ctrl & CH_CTRL_DIR_TX != 0 {
            Direction::Tx
        } else {
            Direction::Rx
        };
        self.port = config.port;

        if caps.channel_tuning {
            let options = [
                ChannelOption::PollTicks(config.poll_ticks),
                ChannelOption::DataSwap(config.data_swap),
                ChannelOption::DescSwap(config.desc_swap),
                ChannelOption::ByteOffset(config.byte_offset),
                ChannelOption::Header(config.header),
                ChannelOption::WriteNonPosted(config.write_non_posted),
                ChannelOption::AdaptiveChop(config.adaptive_chop),
            ];
            for option in options {
                self.apply(regs, caps, option, Apply::Lenient)?;
            }
            if let Some(class) = config.class {
                self.apply(regs, caps, ChannelOption::Class(class), Apply::Lenient)?;
            }
        }

        if let Some(base) = config.hw_descriptors {
            self.set_desc_base(regs, caps, base.addr, base.count)?;
            self.hw_supplied = true;
        }

        self.state = ChannelState::Off;
        Ok(())
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Apply one tuning option
    pub(crate) fn apply<B: RegisterBus>(
        &mut self,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        option: ChannelOption,
        mode: Apply,
    ) -> Result<()> {
        if let ChannelOption::Class(class) = option {
            if class > MAX_CLASS {
                return Err(ConfigError::InvalidClass.into());
            }
        }
        if !gate(mode, caps.channel_tuning, ConfigError::UnsupportedFeature)? {
            return Ok(());
        }
        let is_rx = self.direction == Direction::Rx;
        let index = self.index;

        match option {
            ChannelOption::Class(class) => {
                let memcopy_rx = caps.kind == InstanceKind::MemCopy && is_rx;
                if !gate(mode, !memcopy_rx, ConfigError::InvalidClass)? {
                    return Ok(());
                }
                let class = u32::from(class);
                let value = ((class & 0x7) << CH_CTRL_CLASS_LO_SHIFT)
                    | (((class >> 3) & 0x3) << CH_CTRL_CLASS_HI_SHIFT);
                regs.with_channel(index, |w| {
                    w.update_bits(CH_CTRL_OFFSET, CH_CTRL_CLASS_MASK, value);
                });
            }
            ChannelOption::PollTicks(None) => {
                regs.with_channel(index, |w| {
                    w.set_poll(0);
                    w.update_bits(CH_CFG_OFFSET, CH_CFG_POLL_EN, 0);
                });
            }
            ChannelOption::PollTicks(Some(ticks)) => {
                if !ticks.is_ordered() {
                    #[cfg(feature = "log")]
                    warn!(
                        "ch{}: arbitrated ticks {} exceed non-arbitrated {}, ignored",
                        index, ticks.arb, ticks.non_arb
                    );
                    return Ok(());
                }
                let value = (u32::from(ticks.arb) << CH_POLL_ARB_SHIFT)
                    | (u32::from(ticks.non_arb) << CH_POLL_NON_ARB_SHIFT);
                regs.with_channel(index, |w| {
                    w.set_poll(value);
                    w.update_bits(CH_CFG_OFFSET, CH_CFG_POLL_EN, CH_CFG_POLL_EN);
                });
            }
            ChannelOption::ByteOffset(len) => {
                if !gate(mode, is_rx, ConfigError::UnsupportedDirection)? {
                    return Ok(());
                }
                let value = if len == 0 {
                    0
                } else {
                    CH_CFG_BYTE_OFFSET_EN | (u32::from(len) << CH_CFG_BYTE_OFFSET_SHIFT)
                };
                regs.with_channel(index, |w| {
                    w.update_bits(
                        CH_CFG_OFFSET,
                        CH_CFG_BYTE_OFFSET_EN | CH_CFG_BYTE_OFFSET_MASK,
                        value,
                    );
                });
            }
            ChannelOption::DataSwap(swap) => {
                let value = swap.map_or(0, |t| {
                    CH_CFG_DATA_SWAP_EN | ((t as u32) << CH_CFG_DATA_SWAP_SHIFT)
                });
                regs.with_channel(index, |w| {
                    w.update_bits(
                        CH_CFG_OFFSET,
                        CH_CFG_DATA_SWAP_EN | CH_CFG_DATA_SWAP_MASK,
                        value,
                    );
                });
            }
            ChannelOption::DescSwap(swap) => {
                let value = swap.map_or(0, |t| {
                    CH_CFG_DESC_SWAP_EN | ((t as u32) << CH_CFG_DESC_SWAP_SHIFT)
                });
                regs.with_channel(index, |w| {
                    w.update_bits(
                        CH_CFG_OFFSET,
                        CH_CFG_DESC_SWAP_EN | CH_CFG_DESC_SWAP_MASK,
                        value,
                    );
                });
            }
            ChannelOption::Header(header) => {
                if !gate(mode, is_rx, ConfigError::UnsupportedDirection)? {
                    return Ok(());
                }
                let value = match header {
                    None => 0,
                    Some(h) if !h.is_valid() => {
                        return Err(ConfigError::InvalidHeaderLength.into());
                    }
                    Some(h) if h.checksum => CH_HDR_EN | CH_HDR_CSUM,
                    Some(h) => CH_HDR_EN | (u32::from(h.len) & CH_HDR_LEN_MASK),
                };
                regs.with_channel(index, |w| w.set_hdr(value));
            }
            ChannelOption::WriteNonPosted(enabled) => {
                if !gate(mode, is_rx, ConfigError::UnsupportedDirection)? {
                    return Ok(());
                }
                let value = if enabled { CH_CTRL_WR_NON_POSTED } else { 0 };
                regs.with_channel(index, |w| {
                    w.update_bits(CH_CTRL_OFFSET, CH_CTRL_WR_NON_POSTED, value);
                });
            }
            ChannelOption::AdaptiveChop(enabled) => {
                if !gate(mode, !is_rx, ConfigError::UnsupportedDirection)? {
                    return Ok(());
                }
                if !gate(mode, caps.adaptive_chop, ConfigError::UnsupportedFeature)? {
                    return Ok(());
                }
                let value = if enabled { CH_CTRL_ADAPTIVE_CHOP } else { 0 };
                regs.with_channel(index, |w| {
                    w.update_bits(CH_CTRL_OFFSET, CH_CTRL_ADAPTIVE_CHOP, value);
                });
            }
        }
        Ok(())
    }

    /// Read the class back from its two register fields
    pub fn class<B: RegisterBus>(&self, regs: &DmaRegisters<B>) -> u8 {
        let ctrl = regs.with_channel(self.index, |w| w.ctrl());
        let lo = (ctrl & CH_CTRL_CLASS_LO_MASK) >> CH_CTRL_CLASS_LO_SHIFT;
        let hi = (ctrl & CH_CTRL_CLASS_HI_MASK) >> CH_CTRL_CLASS_HI_SHIFT;
        ((hi << 3) | lo) as u8
    }

    // =========================================================================
    // Descriptor Base
    // =========================================================================

    /// Program the descriptor base address and count
    ///
    /// The hardware only treats a changed base as authoritative while the
    /// channel is off.
    pub fn set_desc_base<B: RegisterBus>(
        &mut self,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        addr: u64,
        count: u16,
    ) -> Result<()> {
        DescriptorBase::new(addr, count).validate(caps)?;

        regs.with_channel(self.index, |w| {
            w.set_desc_base_lo(addr as u32);
            if caps.addressing_36bit {
                w.set_desc_base_hi((addr >> 32) as u32 & CH_DESC_BASE_HI_MASK);
            }
            w.set_desc_count(u32::from(count) & CH_DESC_COUNT_MASK);
        });
        self.desc_base = addr;
        self.desc_count = count;
        self.desc_init = true;
        self.reset_done = false;
        Ok(())
    }

    // =========================================================================
    // On / Off / Reset
    // =========================================================================

    /// Start the channel
    ///
    /// Refused, without touching the hardware, until a descriptor base has
    /// been programmed.
    pub fn turn_on<B: RegisterBus>(&mut self, regs: &DmaRegisters<B>) -> Result<()> {
        if !self.desc_init {
            return Err(DmaError::DescriptorsNotConfigured.into());
        }
        if self.state == ChannelState::Unconfigured || self.state == ChannelState::Resetting {
            return Err(IoError::InvalidState.into());
        }
        regs.with_channel(self.index, |w| {
            w.update_bits(CH_CTRL_OFFSET, CH_CTRL_ENABLE, CH_CTRL_ENABLE);
        });
        self.state = ChannelState::On;
        Ok(())
    }

    /// Stop the channel and wait until the hardware confirms it
    ///
    /// With valid-fetch acknowledgement active this also waits for any
    /// issued descriptor fetch to complete. On timeout the channel state is
    /// unknown and the caller must not reuse its descriptors.
    pub fn turn_off<B: RegisterBus, D: DelayNs>(
        &mut self,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        delay: &mut D,
    ) -> Result<()> {
        let index = self.index;
        regs.with_channel(index, |w| w.update_bits(CH_CTRL_OFFSET, CH_CTRL_ENABLE, 0));

        let mut busy = CH_STATUS_ENABLED;
        if caps.valid_fetch_ack {
            busy |= CH_STATUS_FETCH_PENDING;
        }
        let result = poll_until(delay, CHANNEL_POLL_TIMEOUT_US, POLL_INTERVAL_US, || {
            regs.with_channel(index, |w| w.status() & busy == 0)
        });
        if let Err(e) = result {
            #[cfg(feature = "log")]
            warn!("ch{}: disable not confirmed", index);
            return Err(e.into());
        }
        if self.state != ChannelState::Unconfigured {
            self.state = ChannelState::Off;
        }
        Ok(())
    }

    /// Turn off, then pulse the channel reset and wait for it to self-clear
    ///
    /// A reset channel needs a new descriptor base before it can run again.
    pub fn reset<B: RegisterBus, D: DelayNs>(
        &mut self,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        delay: &mut D,
    ) -> Result<()> {
        self.turn_off(regs, caps, delay)?;

        let index = self.index;
        let previous = self.state;
        self.state = ChannelState::Resetting;
        regs.with_channel(index, |w| {
            w.update_bits(CH_CTRL_OFFSET, CH_CTRL_RESET, CH_CTRL_RESET);
        });
        let result = poll_until(delay, CHANNEL_POLL_TIMEOUT_US, POLL_INTERVAL_US, || {
            regs.with_channel(index, |w| w.ctrl() & CH_CTRL_RESET == 0)
        });
        if let Err(e) = result {
            #[cfg(feature = "log")]
            warn!("ch{}: reset not confirmed", index);
            return Err(e.into());
        }

        self.desc_init = false;
        self.reset_done = true;
        self.state = match previous {
            ChannelState::Unconfigured => ChannelState::Unconfigured,
            _ => ChannelState::Off,
        };
        Ok(())
    }

    // =========================================================================
    // Interrupts and Diagnostics
    // =========================================================================

    /// Acknowledge every pending cause in the channel's own cause register
    pub fn clear_irq_cause<B: RegisterBus>(&self, regs: &DmaRegisters<B>) -> u32 {
        regs.with_channel(self.index, |w| {
            let cause = w.irq_cause();
            if cause != 0 {
                w.set_irq_cause(cause);
            }
            cause
        })
    }

    /// Advance the legacy ring doorbell to `tail`
    pub fn set_tail<B: RegisterBus>(&self, regs: &DmaRegisters<B>, tail: u32) {
        regs.with_channel(self.index, |w| w.set_tail(tail));
    }

    /// Read every register of the channel window
    pub fn dump<B: RegisterBus>(&self, regs: &DmaRegisters<B>) -> ChannelRegisterDump {
        regs.with_channel(self.index, |w| ChannelRegisterDump {
            channel: w.channel(),
            ctrl: w.ctrl(),
            status: w.status(),
            desc_base_lo: w.desc_base_lo(),
            desc_base_hi: w.desc_base_hi(),
            desc_count: w.desc_count(),
            irq_enable: w.irq_enable(),
            irq_cause: w.irq_cause(),
            poll: w.poll(),
            cfg: w.cfg(),
            hdr: w.hdr(),
            tail: w.tail(),
            head: w.head(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::capability::Revision;
    use crate::testing::{MockDelay, MockHardware};

    const TX_CH: u8 = 3;
    const RX_CH: u8 = 4;

    struct Fixture {
        hw: MockHardware,
        regs: DmaRegisters<MockHardware>,
        caps: Capabilities,
        delay: MockDelay,
    }

    fn fixture(kind: InstanceKind, revision: Revision) -> Fixture {
        let hw = MockHardware::new();
        hw.set_tx_channels(1 << TX_CH);
        let regs = DmaRegisters::new(hw.clone());
        Fixture {
            hw,
            regs,
            caps: Capabilities::lookup(kind, revision),
            delay: MockDelay::new(),
        }
    }

    fn configured(f: &Fixture, index: u8, config: &ChannelConfig) -> Channel {
        let mut ch = Channel::new(index);
        ch.configure(&f.regs, &f.caps, config).unwrap();
        ch
    }

    // =========================================================================
    // Configure
    // =========================================================================

    #[test]
    fn configure_reads_direction_from_hardware() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let tx = configured(&f, TX_CH, &ChannelConfig::new());
        let rx = configured(&f, RX_CH, &ChannelConfig::new());

        assert_eq!(tx.direction(), Direction::Tx);
        assert_eq!(rx.direction(), Direction::Rx);
        assert_eq!(tx.state(), ChannelState::Off);
        assert!(!tx.desc_init());
    }

    #[test]
    fn configure_preserves_class_and_applies_control() {
        let f = fixture(InstanceKind::Tx, Revision::Gen1);
        let class_bits = (5 << CH_CTRL_CLASS_LO_SHIFT) | (2 << CH_CTRL_CLASS_HI_SHIFT);
        f.hw.set_channel_reg(TX_CH, CH_CTRL_OFFSET, class_bits);

        let config = ChannelConfig::new().with_control(crate::driver::config::ChannelControl {
            prefetch: true,
            stop_on_error: false,
            strict_order: false,
        });
        let ch = configured(&f, TX_CH, &config);

        let ctrl = f.hw.channel_reg(TX_CH, CH_CTRL_OFFSET);
        assert_eq!(ctrl & CH_CTRL_CLASS_MASK, class_bits);
        assert_ne!(ctrl & CH_CTRL_PREFETCH, 0);
        assert_eq!(ch.class(&f.regs), 21);
    }

    #[test]
    fn configure_clears_and_reenables_interrupts() {
        let f = fixture(InstanceKind::Tx, Revision::Gen3);
        f.hw.set_channel_reg(TX_CH, CH_IRQ_CAUSE_OFFSET, CH_IRQ_COMPLETE);
        configured(&f, TX_CH, &ChannelConfig::new());

        assert_eq!(f.hw.channel_reg(TX_CH, CH_IRQ_CAUSE_OFFSET), 0);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_IRQ_ENABLE_OFFSET), CH_IRQ_ALL);

        let f = fixture(InstanceKind::Tx, Revision::Gen2);
        configured(&f, TX_CH, &ChannelConfig::new());
        assert_eq!(
            f.hw.channel_reg(TX_CH, CH_IRQ_ENABLE_OFFSET),
            CH_IRQ_COMPLETE | CH_IRQ_ERROR
        );
    }

    #[test]
    fn configure_skips_direction_mismatched_options() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let config = ChannelConfig::new()
            .with_byte_offset(8)
            .with_header(HeaderMode::split(64))
            .with_write_non_posted(true)
            .with_adaptive_chop(true);

        configured(&f, TX_CH, &config);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_CFG_OFFSET) & CH_CFG_BYTE_OFFSET_EN, 0);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_HDR_OFFSET), 0);
        let ctrl = f.hw.channel_reg(TX_CH, CH_CTRL_OFFSET);
        assert_eq!(ctrl & CH_CTRL_WR_NON_POSTED, 0);
        assert_ne!(ctrl & CH_CTRL_ADAPTIVE_CHOP, 0);

        configured(&f, RX_CH, &config);
        assert_ne!(f.hw.channel_reg(RX_CH, CH_CFG_OFFSET) & CH_CFG_BYTE_OFFSET_EN, 0);
        assert_eq!(f.hw.channel_reg(RX_CH, CH_HDR_OFFSET), CH_HDR_EN | 64);
        let ctrl = f.hw.channel_reg(RX_CH, CH_CTRL_OFFSET);
        assert_ne!(ctrl & CH_CTRL_WR_NON_POSTED, 0);
        assert_eq!(ctrl & CH_CTRL_ADAPTIVE_CHOP, 0);
    }

    #[test]
    fn oldest_revision_skips_tuning() {
        let f = fixture(InstanceKind::Rx, Revision::Gen1);
        let config = ChannelConfig::new().with_poll_ticks(1, 2).with_class(7);
        configured(&f, RX_CH, &config);

        assert_eq!(f.hw.channel_reg(RX_CH, CH_POLL_OFFSET), 0);
        assert_eq!(f.hw.channel_reg(RX_CH, CH_CTRL_OFFSET) & CH_CTRL_CLASS_MASK, 0);
    }

    #[test]
    fn configure_programs_hw_supplied_base() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let config = ChannelConfig::new().with_hw_descriptors(0x2_4000_0000, 16);
        let ch = configured(&f, TX_CH, &config);

        assert!(ch.desc_init());
        assert!(ch.is_hw_supplied());
        assert_eq!(f.hw.channel_reg(TX_CH, CH_DESC_BASE_LO_OFFSET), 0x4000_0000);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_DESC_BASE_HI_OFFSET), 0x2);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_DESC_COUNT_OFFSET), 16);
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[test]
    fn class_round_trip_for_every_value() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());

        for class in 0..=MAX_CLASS {
            ch.apply(&f.regs, &f.caps, ChannelOption::Class(class), Apply::Strict).unwrap();
            assert_eq!(ch.class(&f.regs), class);
        }
    }

    #[test]
    fn class_above_limit_rejected_without_write() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new().with_class(9));
        let writes = f.hw.write_count();

        for class in [32u8, 100, 255] {
            let result = ch.apply(&f.regs, &f.caps, ChannelOption::Class(class), Apply::Strict);
            assert_eq!(result, Err(ConfigError::InvalidClass.into()));
        }
        assert_eq!(f.hw.write_count(), writes);
        assert_eq!(ch.class(&f.regs), 9);
    }

    #[test]
    fn class_rejected_on_memcopy_rx_channel() {
        let f = fixture(InstanceKind::MemCopy, Revision::Gen4);
        let mut rx = configured(&f, RX_CH, &ChannelConfig::new());
        let result = rx.apply(&f.regs, &f.caps, ChannelOption::Class(3), Apply::Strict);
        assert_eq!(result, Err(ConfigError::InvalidClass.into()));

        let mut tx = configured(&f, TX_CH, &ChannelConfig::new());
        tx.apply(&f.regs, &f.caps, ChannelOption::Class(3), Apply::Strict).unwrap();
        assert_eq!(tx.class(&f.regs), 3);
    }

    #[test]
    fn unordered_poll_ticks_ignored_without_write() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new().with_poll_ticks(2, 4));
        let writes = f.hw.write_count();

        for (arb, non_arb) in [(5u16, 4u16), (2, 1), (u16::MAX, 1)] {
            let option = ChannelOption::PollTicks(Some(PollTicks::new(arb, non_arb)));
            assert_eq!(ch.apply(&f.regs, &f.caps, option, Apply::Strict), Ok(()));
        }
        assert_eq!(f.hw.write_count(), writes);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_POLL_OFFSET), 2 | (4 << 16));
    }

    #[test]
    fn missing_poll_ticks_disable_polling() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new().with_poll_ticks(3, 3));
        assert_ne!(f.hw.channel_reg(TX_CH, CH_CFG_OFFSET) & CH_CFG_POLL_EN, 0);

        ch.apply(&f.regs, &f.caps, ChannelOption::PollTicks(None), Apply::Strict).unwrap();
        assert_eq!(f.hw.channel_reg(TX_CH, CH_POLL_OFFSET), 0);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_CFG_OFFSET) & CH_CFG_POLL_EN, 0);
    }

    #[test]
    fn byte_offset_zero_is_a_true_disable() {
        let f = fixture(InstanceKind::Rx, Revision::Gen4);
        for prior in [1u8, 17, 255] {
            let mut ch = configured(&f, RX_CH, &ChannelConfig::new().with_byte_offset(prior));
            let cfg = f.hw.channel_reg(RX_CH, CH_CFG_OFFSET);
            assert_eq!(
                cfg & (CH_CFG_BYTE_OFFSET_EN | CH_CFG_BYTE_OFFSET_MASK),
                CH_CFG_BYTE_OFFSET_EN | (u32::from(prior) << CH_CFG_BYTE_OFFSET_SHIFT)
            );

            ch.apply(&f.regs, &f.caps, ChannelOption::ByteOffset(0), Apply::Strict).unwrap();
            let cfg = f.hw.channel_reg(RX_CH, CH_CFG_OFFSET);
            assert_eq!(cfg & (CH_CFG_BYTE_OFFSET_EN | CH_CFG_BYTE_OFFSET_MASK), 0);
        }
    }

    #[test]
    fn strict_setters_report_direction_mismatch() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut tx = configured(&f, TX_CH, &ChannelConfig::new());
        let mut rx = configured(&f, RX_CH, &ChannelConfig::new());
        let dir: Result<()> = Err(ConfigError::UnsupportedDirection.into());

        assert_eq!(tx.apply(&f.regs, &f.caps, ChannelOption::ByteOffset(4), Apply::Strict), dir);
        assert_eq!(tx.apply(&f.regs, &f.caps, ChannelOption::WriteNonPosted(true), Apply::Strict), dir);
        assert_eq!(
            tx.apply(&f.regs, &f.caps, ChannelOption::Header(Some(HeaderMode::checksum())), Apply::Strict),
            dir
        );
        assert_eq!(rx.apply(&f.regs, &f.caps, ChannelOption::AdaptiveChop(true), Apply::Strict), dir);
    }

    #[test]
    fn strict_setters_report_missing_feature() {
        let f = fixture(InstanceKind::Tx, Revision::Gen1);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        let result = ch.apply(&f.regs, &f.caps, ChannelOption::Class(1), Apply::Strict);
        assert_eq!(result, Err(ConfigError::UnsupportedFeature.into()));
    }

    #[test]
    fn header_modes_encode() {
        let f = fixture(InstanceKind::Rx, Revision::Gen4);
        let mut ch = configured(&f, RX_CH, &ChannelConfig::new());

        ch.apply(&f.regs, &f.caps, ChannelOption::Header(Some(HeaderMode::checksum())), Apply::Strict)
            .unwrap();
        assert_eq!(f.hw.channel_reg(RX_CH, CH_HDR_OFFSET), CH_HDR_EN | CH_HDR_CSUM);

        let bad = ch.apply(
            &f.regs,
            &f.caps,
            ChannelOption::Header(Some(HeaderMode::split(0x4000))),
            Apply::Strict,
        );
        assert_eq!(bad, Err(ConfigError::InvalidHeaderLength.into()));
        assert_eq!(f.hw.channel_reg(RX_CH, CH_HDR_OFFSET), CH_HDR_EN | CH_HDR_CSUM);

        ch.apply(&f.regs, &f.caps, ChannelOption::Header(None), Apply::Strict).unwrap();
        assert_eq!(f.hw.channel_reg(RX_CH, CH_HDR_OFFSET), 0);
    }

    #[test]
    fn swap_options_encode_type() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let config = ChannelConfig::new()
            .with_data_swap(SwapType::DoubleWord)
            .with_desc_swap(SwapType::Word);
        let mut ch = configured(&f, TX_CH, &config);

        let cfg = f.hw.channel_reg(TX_CH, CH_CFG_OFFSET);
        assert_eq!(cfg & CH_CFG_DATA_SWAP_MASK, 2 << CH_CFG_DATA_SWAP_SHIFT);
        assert_eq!(cfg & CH_CFG_DESC_SWAP_MASK, 1 << CH_CFG_DESC_SWAP_SHIFT);
        assert_ne!(cfg & CH_CFG_DATA_SWAP_EN, 0);

        ch.apply(&f.regs, &f.caps, ChannelOption::DataSwap(None), Apply::Strict).unwrap();
        let cfg = f.hw.channel_reg(TX_CH, CH_CFG_OFFSET);
        assert_eq!(cfg & (CH_CFG_DATA_SWAP_EN | CH_CFG_DATA_SWAP_MASK), 0);
        assert_ne!(cfg & CH_CFG_DESC_SWAP_EN, 0);
    }

    // =========================================================================
    // State Machine
    // =========================================================================

    #[test]
    fn turn_on_requires_descriptor_base() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut unconfigured = Channel::new(TX_CH);
        let mut configured_ch = configured(&f, TX_CH, &ChannelConfig::new());
        let writes = f.hw.write_count();

        let err: Result<()> = Err(DmaError::DescriptorsNotConfigured.into());
        assert_eq!(unconfigured.turn_on(&f.regs), err);
        assert_eq!(configured_ch.turn_on(&f.regs), err);
        assert_eq!(f.hw.write_count(), writes);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_CTRL_OFFSET) & CH_CTRL_ENABLE, 0);
    }

    #[test]
    fn off_on_off_keeps_descriptors() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 64).unwrap();

        for _ in 0..2 {
            ch.turn_on(&f.regs).unwrap();
            assert!(ch.is_on());
            assert!(ch.desc_init());
            ch.turn_off(&f.regs, &f.caps, &mut f.delay).unwrap();
            assert_eq!(ch.state(), ChannelState::Off);
            assert!(ch.desc_init());
        }
    }

    #[test]
    fn turn_off_times_out_within_bound() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 8).unwrap();
        ch.turn_on(&f.regs).unwrap();
        f.hw.set_stuck_enable(TX_CH, true);

        let result = ch.turn_off(&f.regs, &f.caps, &mut f.delay);
        assert_eq!(result, Err(IoError::Timeout.into()));
        assert!(f.delay.total_us() <= u64::from(CHANNEL_POLL_TIMEOUT_US + POLL_INTERVAL_US));
        assert!(f.delay.total_us() >= u64::from(CHANNEL_POLL_TIMEOUT_US));
    }

    #[test]
    fn turn_off_waits_for_fetch_ack() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 8).unwrap();
        ch.turn_on(&f.regs).unwrap();
        f.hw.set_fetch_pending(TX_CH, true);

        let result = ch.turn_off(&f.regs, &f.caps, &mut f.delay);
        assert_eq!(result, Err(IoError::Timeout.into()));

        let mut no_ack = f.caps;
        no_ack.valid_fetch_ack = false;
        assert_eq!(ch.turn_off(&f.regs, &no_ack, &mut f.delay), Ok(()));
    }

    #[test]
    fn reset_clears_descriptor_state() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 8).unwrap();
        ch.turn_on(&f.regs).unwrap();

        ch.reset(&f.regs, &f.caps, &mut f.delay).unwrap();
        assert_eq!(ch.state(), ChannelState::Off);
        assert!(!ch.desc_init());
        assert!(ch.was_reset());
        assert_eq!(f.hw.channel_reg(TX_CH, CH_CTRL_OFFSET) & CH_CTRL_RESET, 0);
        assert_eq!(ch.turn_on(&f.regs), Err(DmaError::DescriptorsNotConfigured.into()));
    }

    #[test]
    fn reset_propagates_turn_off_timeout() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 8).unwrap();
        ch.turn_on(&f.regs).unwrap();
        f.hw.set_stuck_enable(TX_CH, true);

        assert_eq!(ch.reset(&f.regs, &f.caps, &mut f.delay), Err(IoError::Timeout.into()));
        assert!(ch.desc_init());
        assert_eq!(f.hw.channel_reg(TX_CH, CH_CTRL_OFFSET) & CH_CTRL_RESET, 0);
    }

    #[test]
    fn reset_times_out_when_bit_never_clears() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 8).unwrap();
        f.hw.set_stuck_reset(TX_CH, true);

        assert_eq!(ch.reset(&f.regs, &f.caps, &mut f.delay), Err(IoError::Timeout.into()));
        assert_eq!(ch.state(), ChannelState::Resetting);
    }

    #[test]
    fn set_desc_base_validates_before_writing() {
        let f = fixture(InstanceKind::Tx, Revision::Gen1);
        let mut ch = configured(&f, TX_CH, &ChannelConfig::new());
        let writes = f.hw.write_count();

        assert_eq!(
            ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 0),
            Err(ConfigError::InvalidDescriptorCount.into())
        );
        assert_eq!(
            ch.set_desc_base(&f.regs, &f.caps, 0x1_0000_0000, 4),
            Err(ConfigError::InvalidAddress.into())
        );
        assert_eq!(f.hw.write_count(), writes);
        assert!(!ch.desc_init());

        ch.set_desc_base(&f.regs, &f.caps, 0x8000_0000, 4).unwrap();
        assert_eq!(f.hw.channel_reg(TX_CH, CH_DESC_BASE_HI_OFFSET), 0);
    }

    #[test]
    fn new_revision_tx_channel_three_scenario() {
        let mut f = fixture(InstanceKind::Tx, Revision::Gen4);
        let mut ch = configured(&f, 3, &ChannelConfig::new());
        assert_eq!(ch.direction(), Direction::Tx);

        ch.set_desc_base(&f.regs, &f.caps, 0x1000_0000, 64).unwrap();
        ch.turn_on(&f.regs).unwrap();
        assert_ne!(f.hw.channel_reg(3, CH_CTRL_OFFSET) & CH_CTRL_ENABLE, 0);

        ch.turn_off(&f.regs, &f.caps, &mut f.delay).unwrap();
        assert_eq!(f.hw.channel_reg(3, CH_CTRL_OFFSET) & CH_CTRL_ENABLE, 0);
        assert_eq!(ch.dump(&f.regs).status & CH_STATUS_ENABLED, 0);

        ch.turn_on(&f.regs).unwrap();
        assert_eq!(f.hw.channel_reg(3, CH_DESC_BASE_LO_OFFSET), 0x1000_0000);
        assert_eq!(f.hw.channel_reg(3, CH_DESC_COUNT_OFFSET), 64);
    }

    #[test]
    fn clear_irq_cause_acknowledges_pending_bits() {
        let f = fixture(InstanceKind::Tx, Revision::Gen4);
        let ch = configured(&f, TX_CH, &ChannelConfig::new());
        f.hw.set_channel_reg(TX_CH, CH_IRQ_CAUSE_OFFSET, CH_IRQ_COMPLETE | CH_IRQ_ERROR);

        assert_eq!(ch.clear_irq_cause(&f.regs), CH_IRQ_COMPLETE | CH_IRQ_ERROR);
        assert_eq!(f.hw.channel_reg(TX_CH, CH_IRQ_CAUSE_OFFSET), 0);
    }
}
