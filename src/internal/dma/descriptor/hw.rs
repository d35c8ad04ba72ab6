//! In-memory descriptor shared with the controller.

use super::VolatileCell;
use super::bits::{ctrl, ext};

/// Hardware DMA descriptor (16 bytes)
#[repr(C, align(16))]
pub struct HwDescriptor {
    /// Word 0: buffer bus address, bits 31:0
    buffer_addr: VolatileCell<u32>,
    /// Word 1: length, flags and ownership
    control: VolatileCell<u32>,
    /// Word 2: next descriptor bus address, bits 31:0
    next_desc: VolatileCell<u32>,
    /// Word 3: address bits 35:32 for buffer and next descriptor
    addr_ext: VolatileCell<u32>,
}

impl HwDescriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 16;

    /// Create a new zeroed descriptor owned by the CPU.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer_addr: VolatileCell::new(0),
            control: VolatileCell::new(0),
            next_desc: VolatileCell::new(0),
            addr_ext: VolatileCell::new(0),
        }
    }

    #[inline(always)]
    fn control_word(&self) -> u32 {
        u32::from_le(self.control.get())
    }

    #[inline(always)]
    fn set_control_word(&self, value: u32) {
        self.control.set(value.to_le());
    }

    /// Link this descriptor to the next one in the chain.
    pub fn set_next(&self, next: u64) {
        self.next_desc.set((next as u32).to_le());
        let hi = ((next >> 32) as u32) << ext::NEXT_HI_SHIFT;
        let word = u32::from_le(self.addr_ext.get());
        self.addr_ext
            .set(((word & !ext::NEXT_HI_MASK) | (hi & ext::NEXT_HI_MASK)).to_le());
    }

    /// Fill in one segment. Ownership stays with the CPU.
    pub fn prepare(&self, addr: u64, len: u32, first: bool, last: bool) {
        self.buffer_addr.set((addr as u32).to_le());
        let word = u32::from_le(self.addr_ext.get());
        self.addr_ext
            .set(((word & !ext::BUF_HI_MASK) | ((addr >> 32) as u32 & ext::BUF_HI_MASK)).to_le());

        let mut flags = len & ctrl::LEN_MASK;
        if first {
            flags |= ctrl::SOP;
        }
        if last {
            flags |= ctrl::EOP | ctrl::IOC;
        }
        self.set_control_word(flags);
    }

    /// Hand the descriptor to the controller.
    #[inline(always)]
    pub fn set_owned(&self) {
        self.set_control_word(self.control_word() | ctrl::OWN);
    }

    /// Take the descriptor back for the CPU.
    #[inline(always)]
    pub fn clear_owned(&self) {
        self.set_control_word(self.control_word() & !ctrl::OWN);
    }

    /// Check if descriptor is owned by the controller.
    #[inline(always)]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        (self.control_word() & ctrl::OWN) != 0
    }

    /// Check if the controller flagged an error on this segment.
    #[inline(always)]
    #[must_use]
    pub fn has_error(&self) -> bool {
        (self.control_word() & ctrl::ERROR) != 0
    }

    /// Segment length in bytes.
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.control_word() & ctrl::LEN_MASK
    }

    /// True for a zero-length segment.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First segment of a transfer.
    #[inline(always)]
    #[must_use]
    pub fn is_first(&self) -> bool {
        (self.control_word() & ctrl::SOP) != 0
    }

    /// Last segment of a transfer.
    #[inline(always)]
    #[must_use]
    pub fn is_last(&self) -> bool {
        (self.control_word() & ctrl::EOP) != 0
    }

    /// Full 36-bit buffer address.
    #[must_use]
    pub fn buffer_addr(&self) -> u64 {
        let hi = u32::from_le(self.addr_ext.get()) & ext::BUF_HI_MASK;
        (u64::from(hi) << 32) | u64::from(u32::from_le(self.buffer_addr.get()))
    }

    /// Full 36-bit next-descriptor address.
    #[must_use]
    pub fn next_addr(&self) -> u64 {
        let hi = (u32::from_le(self.addr_ext.get()) & ext::NEXT_HI_MASK) >> ext::NEXT_HI_SHIFT;
        (u64::from(hi) << 32) | u64::from(u32::from_le(self.next_desc.get()))
    }

    /// Return the descriptor to its idle state, keeping the chain link.
    pub fn reset(&self) {
        self.buffer_addr.set(0);
        self.set_control_word(0);
        let word = u32::from_le(self.addr_ext.get());
        self.addr_ext.set((word & ext::NEXT_HI_MASK).to_le());
    }

    /// Raw control word for debugging.
    #[inline(always)]
    #[must_use]
    pub fn raw_control(&self) -> u32 {
        self.control_word()
    }

    /// Simulate controller completion (test only)
    #[cfg(test)]
    pub fn complete(&self) {
        self.clear_owned();
    }
}

impl Default for HwDescriptor {
    fn default() -> Self {
        Self::new()
    }
}
