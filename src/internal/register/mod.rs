//! Memory-mapped register access for the DMA controller
//!
//! All register traffic goes through a [`RegisterBus`]. On hardware that is
//! an [`MmioBus`] over the controller's register block; host tests plug in a
//! register model instead. [`DmaRegisters`] wraps the bus in a critical
//! section so that the channel and port selectors can never be changed by
//! an interrupt between "select" and "access".

pub mod channel;
pub mod global;
pub mod port;

use crate::sync::CriticalSectionCell;

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

// =============================================================================
// Bus Abstraction
// =============================================================================

/// Raw 32-bit register access by byte offset from the controller base
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read(&mut self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write(&mut self, offset: usize, value: u32);
}

/// Volatile MMIO access to a register block at a fixed base address
#[derive(Debug)]
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// Create a bus over the register block at `base`
    ///
    /// # Safety
    /// `base` must be the address of the controller's register block, valid
    /// for volatile 32-bit access for the lifetime of the bus, and no other
    /// code may access that block concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Register block base address
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBus for MmioBus {
    #[inline(always)]
    fn read(&mut self, offset: usize) -> u32 {
        // SAFETY: `new` requires a valid, exclusively owned register block
        unsafe { read_reg(self.base + offset) }
    }

    #[inline(always)]
    fn write(&mut self, offset: usize, value: u32) {
        // SAFETY: `new` requires a valid, exclusively owned register block
        unsafe { write_reg(self.base + offset, value) }
    }
}

// =============================================================================
// Read-modify-write helpers
// =============================================================================

/// Replace the bits under `mask` with `value`, skipping the write when the
/// register already holds the requested value.
///
/// Returns `true` if a write was issued.
#[inline]
fn update_bits_on<B: RegisterBus>(bus: &mut B, offset: usize, mask: u32, value: u32) -> bool {
    let old = bus.read(offset);
    let new = (old & !mask) | (value & mask);
    if new == old {
        return false;
    }
    bus.write(offset, new);
    true
}

// =============================================================================
// Accessor Macros
// =============================================================================

/// Generate read/write accessor methods for a windowed register.
macro_rules! window_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&mut self) -> u32 {
            self.bus.read($offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&mut self, value: u32) {
            self.bus.write($offset, value)
        }
    };
}

/// Generate a read-only accessor method for a windowed register.
macro_rules! window_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&mut self) -> u32 {
            self.bus.read($offset)
        }
    };
}

// =============================================================================
// Selected windows
// =============================================================================

/// Access to one channel's register window
///
/// Only obtainable through [`DmaRegisters::with_channel`], which selects the
/// channel first and holds the critical section for the window's lifetime.
pub struct ChannelWindow<'a, B: RegisterBus> {
    bus: &'a mut B,
    channel: u8,
}

impl<B: RegisterBus> ChannelWindow<'_, B> {
    /// Channel this window refers to
    pub fn channel(&self) -> u8 {
        self.channel
    }

    window_rw!(ctrl, set_ctrl, channel::CH_CTRL_OFFSET, "channel control");
    window_ro!(status, channel::CH_STATUS_OFFSET, "channel status");
    window_rw!(desc_base_lo, set_desc_base_lo, channel::CH_DESC_BASE_LO_OFFSET, "descriptor base (low)");
    window_rw!(desc_base_hi, set_desc_base_hi, channel::CH_DESC_BASE_HI_OFFSET, "descriptor base (high)");
    window_rw!(desc_count, set_desc_count, channel::CH_DESC_COUNT_OFFSET, "descriptor count");
    window_rw!(irq_enable, set_irq_enable, channel::CH_IRQ_ENABLE_OFFSET, "channel interrupt enable");
    window_rw!(irq_cause, set_irq_cause, channel::CH_IRQ_CAUSE_OFFSET, "channel interrupt cause");
    window_rw!(poll, set_poll, channel::CH_POLL_OFFSET, "polling ticks");
    window_rw!(cfg, set_cfg, channel::CH_CFG_OFFSET, "channel feature configuration");
    window_rw!(hdr, set_hdr, channel::CH_HDR_OFFSET, "header mode configuration");
    window_rw!(tail, set_tail, channel::CH_TAIL_OFFSET, "ring tail index");
    window_ro!(head, channel::CH_HEAD_OFFSET, "hardware ring head index");

    /// Read-modify-write under `mask`; returns `true` if a write was issued
    #[inline]
    pub fn update_bits(&mut self, offset: usize, mask: u32, value: u32) -> bool {
        update_bits_on(&mut *self.bus, offset, mask, value)
    }
}

/// Access to one port's control register
pub struct PortWindow<'a, B: RegisterBus> {
    bus: &'a mut B,
}

impl<B: RegisterBus> PortWindow<'_, B> {
    window_rw!(ctrl, set_ctrl, port::PORT_CTRL_OFFSET, "port control");

    /// Read-modify-write of the port control register
    #[inline]
    pub fn update_ctrl(&mut self, mask: u32, value: u32) -> bool {
        update_bits_on(&mut *self.bus, port::PORT_CTRL_OFFSET, mask, value)
    }
}

// =============================================================================
// Shared register block
// =============================================================================

/// The controller's register block, shared between thread and interrupt
/// context
///
/// Every method runs inside a critical section. Poll loops must not be
/// written inside [`with_channel`](Self::with_channel); call it once per
/// iteration instead so interrupts can run in between.
pub struct DmaRegisters<B> {
    bus: CriticalSectionCell<B>,
}

impl<B: RegisterBus> DmaRegisters<B> {
    /// Wrap a register bus
    pub const fn new(bus: B) -> Self {
        Self {
            bus: CriticalSectionCell::new(bus),
        }
    }

    /// Read a global register
    #[inline]
    pub fn read(&self, offset: usize) -> u32 {
        self.bus.with(|bus| bus.read(offset))
    }

    /// Write a global register
    #[inline]
    pub fn write(&self, offset: usize, value: u32) {
        self.bus.with(|bus| bus.write(offset, value))
    }

    /// Read-modify-write under `mask`; returns `true` if a write was issued
    #[inline]
    pub fn update_bits(&self, offset: usize, mask: u32, value: u32) -> bool {
        self.bus.with(|bus| update_bits_on(bus, offset, mask, value))
    }

    /// Set bits in a global register
    #[inline]
    pub fn set_bits(&self, offset: usize, bits: u32) -> bool {
        self.update_bits(offset, bits, bits)
    }

    /// Clear bits in a global register
    #[inline]
    pub fn clear_bits(&self, offset: usize, bits: u32) -> bool {
        self.update_bits(offset, bits, 0)
    }

    /// Select `channel` and run `f` against its register window
    pub fn with_channel<R, F>(&self, channel: u8, f: F) -> R
    where
        F: FnOnce(&mut ChannelWindow<'_, B>) -> R,
    {
        self.bus.with(|bus| {
            bus.write(global::CHAN_SELECT_OFFSET, u32::from(channel));
            let mut window = ChannelWindow { bus, channel };
            f(&mut window)
        })
    }

    /// Select `port` and run `f` against its register window
    pub fn with_port<R, F>(&self, port: u8, f: F) -> R
    where
        F: FnOnce(&mut PortWindow<'_, B>) -> R,
    {
        self.bus.with(|bus| {
            bus.write(port::PORT_SELECT_OFFSET, u32::from(port));
            let mut window = PortWindow { bus };
            f(&mut window)
        })
    }
}
