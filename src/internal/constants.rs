//! Centralized Constants
//!
//! Single source of truth for the limits and timing values used throughout
//! the controller driver.
//!
//! # Note
//!
//! Register offsets and bit definitions stay in their respective modules
//! (`register/global.rs`, `register/channel.rs`, `register/port.rs`) since
//! they describe one hardware block each.

// =============================================================================
// Topology
// =============================================================================

/// Maximum number of channels a single controller instance can expose
/// (one bit per channel in the cause and mask registers)
pub const MAX_CHANNELS: usize = 32;

/// Maximum number of physical ports per controller instance
pub const MAX_PORTS: usize = 8;

/// Number of entries in the resource-pool offset table
pub const RESOURCE_POOL_SLOTS: usize = 8;

// =============================================================================
// Descriptors
// =============================================================================

/// Size of one hardware descriptor in bytes
pub const DESCRIPTOR_SIZE: usize = 16;

/// Largest byte count a single hardware descriptor can carry (64 KiB - 1)
pub const MAX_SEGMENT_LEN: usize = 0xFFFF;

/// Hardware maximum for a channel's descriptor count
pub const MAX_DESCRIPTOR_COUNT: u16 = 4096;

/// Default number of ring descriptors carved out per legacy channel
pub const DEFAULT_DESCRIPTORS_PER_CHANNEL: u16 = 64;

/// Software descriptors that may be queued on one channel at a time
pub const MAX_QUEUED_TRANSFERS: usize = 8;

/// Highest bus address reachable with the 36-bit addressing extension
pub const MAX_BUS_ADDR_36BIT: u64 = (1 << 36) - 1;

/// Highest bus address reachable with plain 32-bit addressing
pub const MAX_BUS_ADDR_32BIT: u64 = u32::MAX as u64;

// =============================================================================
// Channel Parameter Limits
// =============================================================================

/// Highest class/priority value (5 bits)
pub const MAX_CLASS: u8 = 31;

/// Highest byte-offset length
pub const MAX_BYTE_OFFSET: u8 = 255;

/// Highest header-mode length (14 bits)
pub const MAX_HEADER_LEN: u16 = 0x3FFF;

/// Highest port endian-swap index (3 bits)
pub const MAX_ENDIAN_INDEX: u8 = 7;

// =============================================================================
// Timing Constants
// =============================================================================

/// Budget for channel off/reset and fetch-ack confirmation polls
pub const CHANNEL_POLL_TIMEOUT_US: u32 = 10_000;

/// Delay between two reads of a polled status bit
pub const POLL_INTERVAL_US: u32 = 10;

/// Time the functional reset line is held asserted during bring-up
pub const RESET_ASSERT_US: u32 = 10;

/// Settle time after releasing the functional reset line
pub const RESET_RELEASE_US: u32 = 10;
