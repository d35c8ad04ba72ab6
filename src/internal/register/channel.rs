//! Channel Register Definitions
//!
//! Every register in this block is windowed by `CHAN_SELECT`. Accessing one
//! without first selecting the channel touches whichever channel happened to
//! be selected last, which is why the driver only reaches them through
//! [`ChannelWindow`](super::ChannelWindow).

// =============================================================================
// Register Offsets
// =============================================================================

/// Channel control register offset
pub const CH_CTRL_OFFSET: usize = 0x100;
/// Channel status register offset (read-only)
pub const CH_STATUS_OFFSET: usize = 0x104;
/// Descriptor base, low 32 bits
pub const CH_DESC_BASE_LO_OFFSET: usize = 0x108;
/// Descriptor base, high address extension (4 bits)
pub const CH_DESC_BASE_HI_OFFSET: usize = 0x10C;
/// Descriptor count
pub const CH_DESC_COUNT_OFFSET: usize = 0x110;
/// Channel interrupt enable register offset
pub const CH_IRQ_ENABLE_OFFSET: usize = 0x114;
/// Channel interrupt cause register offset (write-1-to-clear)
pub const CH_IRQ_CAUSE_OFFSET: usize = 0x118;
/// Polling tick pair
pub const CH_POLL_OFFSET: usize = 0x11C;
/// Channel feature configuration
pub const CH_CFG_OFFSET: usize = 0x120;
/// Header mode configuration
pub const CH_HDR_OFFSET: usize = 0x124;
/// Ring tail index (legacy ring mode doorbell)
pub const CH_TAIL_OFFSET: usize = 0x128;
/// Ring head index as seen by hardware (read-only)
pub const CH_HEAD_OFFSET: usize = 0x12C;

// =============================================================================
// Control Register (CH_CTRL) Bits
// =============================================================================

/// Channel enable
pub const CH_CTRL_ENABLE: u32 = 1 << 0;
/// Channel reset, self-clearing
pub const CH_CTRL_RESET: u32 = 1 << 1;
/// Channel direction, fixed in silicon (1 = TX)
pub const CH_CTRL_DIR_TX: u32 = 1 << 2;
/// Class low field shift (3 bits)
pub const CH_CTRL_CLASS_LO_SHIFT: u32 = 4;
/// Class low field mask
pub const CH_CTRL_CLASS_LO_MASK: u32 = 0x7 << 4;
/// Write non-posted (receive side)
pub const CH_CTRL_WR_NON_POSTED: u32 = 1 << 8;
/// Adaptive burst chop (transmit side)
pub const CH_CTRL_ADAPTIVE_CHOP: u32 = 1 << 9;
/// Class high field shift (2 bits)
pub const CH_CTRL_CLASS_HI_SHIFT: u32 = 12;
/// Class high field mask
pub const CH_CTRL_CLASS_HI_MASK: u32 = 0x3 << 12;
/// Both class fields
pub const CH_CTRL_CLASS_MASK: u32 = CH_CTRL_CLASS_LO_MASK | CH_CTRL_CLASS_HI_MASK;
/// Descriptor prefetch
pub const CH_CTRL_PREFETCH: u32 = 1 << 16;
/// Stop the channel on a descriptor error
pub const CH_CTRL_STOP_ON_ERROR: u32 = 1 << 17;
/// Strict descriptor ordering
pub const CH_CTRL_STRICT_ORDER: u32 = 1 << 18;
/// Caller-supplied control bits
pub const CH_CTRL_USER_MASK: u32 = CH_CTRL_PREFETCH | CH_CTRL_STOP_ON_ERROR | CH_CTRL_STRICT_ORDER;

// =============================================================================
// Status Register (CH_STATUS) Bits
// =============================================================================

/// Channel is running
pub const CH_STATUS_ENABLED: u32 = 1 << 0;
/// A descriptor fetch has been issued and not yet acknowledged
pub const CH_STATUS_FETCH_PENDING: u32 = 1 << 1;

// =============================================================================
// Interrupt Bits (CH_IRQ_ENABLE / CH_IRQ_CAUSE)
// =============================================================================

/// Transfer complete
pub const CH_IRQ_COMPLETE: u32 = 1 << 0;
/// Descriptor or bus error
pub const CH_IRQ_ERROR: u32 = 1 << 1;
/// Descriptor fetch timeout
pub const CH_IRQ_DESC_TIMEOUT: u32 = 1 << 2;
/// Every channel interrupt source
pub const CH_IRQ_ALL: u32 = CH_IRQ_COMPLETE | CH_IRQ_ERROR | CH_IRQ_DESC_TIMEOUT;

// =============================================================================
// Address / Count Fields
// =============================================================================

/// High address extension mask (bits 35:32)
pub const CH_DESC_BASE_HI_MASK: u32 = 0xF;
/// Descriptor count mask
pub const CH_DESC_COUNT_MASK: u32 = 0xFFFF;

// =============================================================================
// Polling Ticks (CH_POLL)
// =============================================================================

/// Arbitrated tick count shift
pub const CH_POLL_ARB_SHIFT: u32 = 0;
/// Non-arbitrated tick count shift
pub const CH_POLL_NON_ARB_SHIFT: u32 = 16;

// =============================================================================
// Feature Configuration (CH_CFG) Bits
// =============================================================================

/// Byte offset enable
pub const CH_CFG_BYTE_OFFSET_EN: u32 = 1 << 0;
/// Byte offset length shift
pub const CH_CFG_BYTE_OFFSET_SHIFT: u32 = 8;
/// Byte offset length mask
pub const CH_CFG_BYTE_OFFSET_MASK: u32 = 0xFF << 8;
/// Data endian swap enable
pub const CH_CFG_DATA_SWAP_EN: u32 = 1 << 16;
/// Data endian swap type shift
pub const CH_CFG_DATA_SWAP_SHIFT: u32 = 17;
/// Data endian swap type mask
pub const CH_CFG_DATA_SWAP_MASK: u32 = 0x3 << 17;
/// Descriptor endian swap enable
pub const CH_CFG_DESC_SWAP_EN: u32 = 1 << 19;
/// Descriptor endian swap type shift
pub const CH_CFG_DESC_SWAP_SHIFT: u32 = 20;
/// Descriptor endian swap type mask
pub const CH_CFG_DESC_SWAP_MASK: u32 = 0x3 << 20;
/// Per-channel polling enable
pub const CH_CFG_POLL_EN: u32 = 1 << 24;

// =============================================================================
// Header Mode (CH_HDR) Bits
// =============================================================================

/// Header length mask (14 bits)
pub const CH_HDR_LEN_MASK: u32 = 0x3FFF;
/// Header mode enable
pub const CH_HDR_EN: u32 = 1 << 14;
/// Header checksum mode
pub const CH_HDR_CSUM: u32 = 1 << 15;

/// True for offsets that live in the channel window
#[inline(always)]
pub const fn is_channel_register(offset: usize) -> bool {
    offset >= CH_CTRL_OFFSET && offset <= CH_HEAD_OFFSET
}
