//! Controller-wide Register Definitions
//!
//! Registers in this block are not channel scoped. The two selector
//! registers (`CHAN_SELECT`, `PORT_SELECT`) pick which channel or port the
//! windowed registers in `channel.rs` and `port.rs` refer to.

// =============================================================================
// Register Offsets
// =============================================================================

/// Revision/identification register offset (read-only)
pub const REVISION_OFFSET: usize = 0x000;
/// Global configuration register offset
pub const CONFIG_OFFSET: usize = 0x004;
/// Global descriptor polling counter offset
pub const POLL_COUNT_OFFSET: usize = 0x008;
/// Functional reset control register offset
pub const RESET_OFFSET: usize = 0x00C;
/// Interrupt cause register offset (one bit per channel, write-1-to-clear)
pub const IRQ_CAUSE_OFFSET: usize = 0x010;
/// Interrupt mask register offset (one enable bit per channel)
pub const IRQ_MASK_OFFSET: usize = 0x014;
/// Channel select register offset
pub const CHAN_SELECT_OFFSET: usize = 0x018;
/// Descriptor fetch timeout register offset
pub const DESC_TIMEOUT_OFFSET: usize = 0x01C;
/// Outstanding read request count register offset
pub const ORRC_OFFSET: usize = 0x020;
/// First entry of the resource-pool offset table
pub const RES_POOL_OFFSET_BASE: usize = 0x040;

// =============================================================================
// Configuration Register (CONFIG) Bits
// =============================================================================

/// Enable channel arbitration
pub const CONFIG_ARB_EN: u32 = 1 << 0;
/// Enable descriptor polling with the global counter
pub const CONFIG_POLL_EN: u32 = 1 << 1;
/// Enable byte-enable qualified writes
pub const CONFIG_BYTE_EN: u32 = 1 << 2;
/// Enable the descriptor read buffer
pub const CONFIG_DRB: u32 = 1 << 3;
/// Enable per-channel flow control
pub const CONFIG_CH_FLOW_CTRL: u32 = 1 << 4;
/// Fetch descriptors on demand instead of speculatively
pub const CONFIG_FETCH_ON_DEMAND: u32 = 1 << 5;
/// Descriptors live in controller SRAM
pub const CONFIG_SRAM_DESC: u32 = 1 << 6;
/// Double burst write
pub const CONFIG_DOUBLE_BURST_WR: u32 = 1 << 7;
/// Hardware acknowledges every valid descriptor fetch
pub const CONFIG_VALID_FETCH_ACK: u32 = 1 << 8;
/// Descriptor fetch timeout enable
pub const CONFIG_DESC_TIMEOUT_EN: u32 = 1 << 9;
/// Resource-pool offset encoding enable
pub const CONFIG_RES_POOL_EN: u32 = 1 << 10;
/// 36-bit bus addressing
pub const CONFIG_ADDR_36BIT: u32 = 1 << 11;
/// 128-bit data path
pub const CONFIG_DATA_128BIT: u32 = 1 << 12;

// =============================================================================
// Other Fields
// =============================================================================

/// Functional reset line (1 = asserted)
pub const RESET_FUNC: u32 = 1 << 0;

/// Global polling counter mask
pub const POLL_COUNT_MASK: u32 = 0xFFFF;

/// Descriptor timeout value mask
pub const DESC_TIMEOUT_MASK: u32 = 0xFFFF;

/// Outstanding read request count mask
pub const ORRC_MASK: u32 = 0xFF;

/// Resource-pool offset entry mask
pub const RES_POOL_ENTRY_MASK: u32 = 0xFFFF;

/// Byte offset of resource-pool table entry `index`
#[inline(always)]
pub const fn res_pool_offset(index: usize) -> usize {
    RES_POOL_OFFSET_BASE + index * 4
}
