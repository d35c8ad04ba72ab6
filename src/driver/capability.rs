//! Hardware Capability Model
//!
//! A pure lookup keyed by (instance kind, silicon revision). Every component
//! consults the resulting [`Capabilities`] before touching a feature-gated
//! register; nothing here performs I/O.

use crate::internal::constants::MAX_CHANNELS;

/// Silicon revision of the controller, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Revision {
    /// First generation: software ring, linear burst field, no channel tuning
    Gen1,
    /// Adds per-channel tuning, 36-bit addressing, double burst write
    Gen2,
    /// Adds descriptor timeout, fetch acknowledgement, packet drop, burst chop
    Gen3,
    /// Adds SRAM-resident descriptors and resource-pool offsets
    #[default]
    Gen4,
}

impl Revision {
    /// Decode the revision field of the identification register
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw & 0xFF {
            1 => Some(Revision::Gen1),
            2 => Some(Revision::Gen2),
            3 => Some(Revision::Gen3),
            4 => Some(Revision::Gen4),
            _ => None,
        }
    }
}

/// Which engine a controller instance drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstanceKind {
    /// Memory to peripheral
    Tx,
    /// Peripheral to memory
    Rx,
    /// Memory to memory
    MemCopy,
}

/// Who owns the hardware descriptors of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorMode {
    /// The driver carves a ring per channel and tracks each transfer
    LegacyRing,
    /// The client supplies a descriptor block; completion is channel-level
    Direct,
}

/// How burst lengths are encoded in the port control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstEncoding {
    /// 2-bit field: 0 = 8, 1 = 16, 2 = 32 words
    Linear,
    /// Separate "16" and "32" bits; base field value 1 means 8 words
    OneHot,
}

/// Burst length in descriptor words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BurstLen {
    /// 8 words
    Words8 = 8,
    /// 16 words
    Words16 = 16,
    /// 32 words
    #[default]
    Words32 = 32,
}

/// Static description of what one controller instance can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Instance kind this was computed for
    pub kind: InstanceKind,
    /// Revision this was computed for
    pub revision: Revision,
    /// Number of channels the instance exposes
    pub channel_count: u8,
    /// Number of ports the instance exposes
    pub port_count: u8,
    /// Per-channel flow control (TX only)
    pub flow_control: bool,
    /// Fetch-on-demand (not for memcopy)
    pub fetch_on_demand: bool,
    /// Outstanding read request limit (not for RX)
    pub outstanding_reads: bool,
    /// Descriptors resident in controller SRAM
    pub sram_descriptors: bool,
    /// Descriptor fetch timeout
    pub descriptor_timeout: bool,
    /// Resource-pool offset encoding
    pub resource_pool_offsets: bool,
    /// Packet drop on congestion in the port register
    pub packet_drop: bool,
    /// Class, polling ticks, byte offset, endian swap and header mode
    pub channel_tuning: bool,
    /// Adaptive burst chop (TX only)
    pub adaptive_chop: bool,
    /// 36-bit bus addressing
    pub addressing_36bit: bool,
    /// 128-bit data path
    pub data_128bit: bool,
    /// Valid descriptor fetch acknowledgement
    pub valid_fetch_ack: bool,
    /// Double burst write
    pub double_burst_write: bool,
    /// Descriptor ownership model
    pub descriptor_mode: DescriptorMode,
    /// Port burst length encoding
    pub burst_encoding: BurstEncoding,
    /// Burst length used when a port does not specify one
    pub default_burst: BurstLen,
    /// Global polling count used when the configuration does not give one
    pub default_poll_count: u16,
}

impl Capabilities {
    /// Look up the capabilities of `kind` at `revision`
    #[must_use]
    pub const fn lookup(kind: InstanceKind, revision: Revision) -> Self {
        let rev = revision as u8;
        let is_tx = matches!(kind, InstanceKind::Tx);
        let is_rx = matches!(kind, InstanceKind::Rx);
        let is_mem = matches!(kind, InstanceKind::MemCopy);
        let gen2 = rev >= Revision::Gen2 as u8;
        let gen3 = rev >= Revision::Gen3 as u8;
        let gen4 = rev >= Revision::Gen4 as u8;

        let channel_count = match (kind, gen2) {
            (InstanceKind::MemCopy, _) => 8,
            (_, false) => 16,
            (_, true) => MAX_CHANNELS as u8,
        };

        Self {
            kind,
            revision,
            channel_count,
            port_count: if is_mem { 1 } else { 4 },
            flow_control: is_tx,
            fetch_on_demand: !is_mem,
            outstanding_reads: !is_rx,
            sram_descriptors: gen4,
            descriptor_timeout: gen3,
            resource_pool_offsets: gen4,
            packet_drop: gen3,
            channel_tuning: gen2,
            adaptive_chop: gen3 && is_tx,
            addressing_36bit: gen2,
            data_128bit: gen4,
            valid_fetch_ack: gen3,
            double_burst_write: gen2,
            descriptor_mode: if gen2 {
                DescriptorMode::Direct
            } else {
                DescriptorMode::LegacyRing
            },
            burst_encoding: if gen2 {
                BurstEncoding::OneHot
            } else {
                BurstEncoding::Linear
            },
            default_burst: if gen2 { BurstLen::Words32 } else { BurstLen::Words16 },
            default_poll_count: if gen2 { 0x40 } else { 0x100 },
        }
    }

    /// Highest bus address a descriptor base may use
    #[must_use]
    pub const fn max_bus_addr(&self) -> u64 {
        if self.addressing_36bit {
            crate::internal::constants::MAX_BUS_ADDR_36BIT
        } else {
            crate::internal::constants::MAX_BUS_ADDR_32BIT
        }
    }

    /// True if the instance uses a driver-owned descriptor ring
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self.descriptor_mode, DescriptorMode::LegacyRing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_are_ordered_oldest_first() {
        assert!(Revision::Gen1 < Revision::Gen2);
        assert!(Revision::Gen3 < Revision::Gen4);
        assert_eq!(Revision::from_raw(0x0000_0103), Some(Revision::Gen3));
        assert_eq!(Revision::from_raw(9), None);
    }

    #[test]
    fn direction_gated_features() {
        let tx = Capabilities::lookup(InstanceKind::Tx, Revision::Gen4);
        let rx = Capabilities::lookup(InstanceKind::Rx, Revision::Gen4);
        let mem = Capabilities::lookup(InstanceKind::MemCopy, Revision::Gen4);

        assert!(tx.flow_control && !rx.flow_control && !mem.flow_control);
        assert!(tx.fetch_on_demand && rx.fetch_on_demand && !mem.fetch_on_demand);
        assert!(tx.outstanding_reads && !rx.outstanding_reads && mem.outstanding_reads);
        assert!(tx.adaptive_chop && !rx.adaptive_chop);
    }

    #[test]
    fn oldest_revision_is_legacy_and_linear() {
        let caps = Capabilities::lookup(InstanceKind::Tx, Revision::Gen1);
        assert!(caps.is_legacy());
        assert_eq!(caps.burst_encoding, BurstEncoding::Linear);
        assert!(!caps.channel_tuning);
        assert!(!caps.addressing_36bit);
        assert_eq!(caps.max_bus_addr(), u32::MAX as u64);
    }

    #[test]
    fn revision_gated_features() {
        let g2 = Capabilities::lookup(InstanceKind::Rx, Revision::Gen2);
        let g3 = Capabilities::lookup(InstanceKind::Rx, Revision::Gen3);
        let g4 = Capabilities::lookup(InstanceKind::Rx, Revision::Gen4);

        assert!(!g2.descriptor_timeout && g3.descriptor_timeout);
        assert!(!g3.resource_pool_offsets && g4.resource_pool_offsets);
        assert!(!g3.sram_descriptors && g4.sram_descriptors);
        assert!(!g2.valid_fetch_ack && g3.valid_fetch_ack);
        assert_eq!(g2.descriptor_mode, DescriptorMode::Direct);
    }
}
