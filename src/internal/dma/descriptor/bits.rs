//! DMA descriptor bit field constants.
//!
//! All four words are stored little-endian in memory regardless of the CPU.

// =============================================================================
// Word 1 - Control
// =============================================================================

/// Descriptor word 1 (control) bit field constants
pub mod ctrl {
    /// Segment length mask (bytes)
    pub const LEN_MASK: u32 = 0xFFFF;
    /// Byte offset into the first buffer word shift
    pub const BYTE_OFFSET_SHIFT: u32 = 16;
    /// Byte offset mask
    pub const BYTE_OFFSET_MASK: u32 = 0x7 << 16;
    /// Start of packet - first segment of a transfer
    pub const SOP: u32 = 1 << 24;
    /// End of packet - last segment of a transfer
    pub const EOP: u32 = 1 << 25;
    /// Raise the completion interrupt once this descriptor is done
    pub const IOC: u32 = 1 << 26;
    /// Hardware reported an error on this segment
    pub const ERROR: u32 = 1 << 27;
    /// OWN - when set, owned by the controller; when clear, owned by CPU
    pub const OWN: u32 = 1 << 31;
}

// =============================================================================
// Word 3 - Address Extension
// =============================================================================

/// Descriptor word 3 (36-bit address extension) bit field constants
pub mod ext {
    /// Buffer address bits 35:32
    pub const BUF_HI_MASK: u32 = 0xF;
    /// Next descriptor address bits 35:32 shift
    pub const NEXT_HI_SHIFT: u32 = 4;
    /// Next descriptor address bits 35:32 mask
    pub const NEXT_HI_MASK: u32 = 0xF << 4;
}
