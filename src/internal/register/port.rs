//! Port Register Definitions
//!
//! `PORT_CTRL` is windowed: it refers to whichever port was last written to
//! `PORT_SELECT`. Two burst encodings exist. The oldest revision packs the
//! burst length into a 2-bit linear field; newer revisions use one-hot
//! "32" and "16" bits, with a 2-bit field value implying "8".

/// Port select register offset
pub const PORT_SELECT_OFFSET: usize = 0x080;
/// Port control register offset (windowed)
pub const PORT_CTRL_OFFSET: usize = 0x084;

// =============================================================================
// Linear Burst Encoding (oldest revision)
// =============================================================================

/// RX burst field shift (linear encoding)
pub const LINEAR_RX_BURST_SHIFT: u32 = 0;
/// TX burst field shift (linear encoding)
pub const LINEAR_TX_BURST_SHIFT: u32 = 8;
/// Linear burst field width mask (before shifting)
pub const LINEAR_BURST_MASK: u32 = 0x3;

// =============================================================================
// One-hot Burst Encoding (newer revisions)
// =============================================================================

/// RX burst base field shift (value 1 implies 8 words)
pub const ONEHOT_RX_BURST_SHIFT: u32 = 0;
/// RX 16-word burst bit
pub const ONEHOT_RX_BURST16: u32 = 1 << 2;
/// RX 32-word burst bit
pub const ONEHOT_RX_BURST32: u32 = 1 << 3;
/// TX burst base field shift (value 1 implies 8 words)
pub const ONEHOT_TX_BURST_SHIFT: u32 = 8;
/// TX 16-word burst bit
pub const ONEHOT_TX_BURST16: u32 = 1 << 10;
/// TX 32-word burst bit
pub const ONEHOT_TX_BURST32: u32 = 1 << 11;
/// Base field value meaning "8 words"
pub const ONEHOT_BURST8_FIELD: u32 = 0x1;

// =============================================================================
// Shared Fields
// =============================================================================

/// RX endian-swap index shift
pub const RX_ENDIAN_SHIFT: u32 = 4;
/// TX endian-swap index shift
pub const TX_ENDIAN_SHIFT: u32 = 12;
/// Endian-swap index width mask (before shifting)
pub const ENDIAN_MASK: u32 = 0x7;
/// Drop packets on congestion (newer revisions only)
pub const PORT_PKT_DROP: u32 = 1 << 16;
