//! Configuration types for the DMA controller
//!
//! [`ControllerConfig`] plays the role of the device-configuration source:
//! it is built once, checked with [`ControllerConfig::validate`], and handed
//! to the controller at bring-up. Malformed values are rejected there, not
//! when the registers are eventually written.

use crate::driver::capability::{BurstLen, Capabilities, InstanceKind, Revision};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_DESCRIPTORS_PER_CHANNEL, DESCRIPTOR_SIZE, MAX_CHANNELS, MAX_CLASS,
    MAX_DESCRIPTOR_COUNT, MAX_ENDIAN_INDEX, MAX_HEADER_LEN, MAX_PORTS, RESOURCE_POOL_SLOTS,
};
use crate::internal::register::channel::{
    CH_CTRL_PREFETCH, CH_CTRL_STOP_ON_ERROR, CH_CTRL_STRICT_ORDER,
};

// =============================================================================
// Channel Parameters
// =============================================================================

/// Polling tick pair (arbitrated must not exceed non-arbitrated)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollTicks {
    /// Ticks between polls while arbitrating
    pub arb: u16,
    /// Ticks between polls while not arbitrating
    pub non_arb: u16,
}

impl PollTicks {
    /// Create a tick pair
    #[must_use]
    pub const fn new(arb: u16, non_arb: u16) -> Self {
        Self { arb, non_arb }
    }

    /// True if the pair honours `arb <= non_arb`
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.arb <= self.non_arb
    }
}

/// Endian swap granularity for data or descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SwapType {
    /// Swap bytes within 16-bit halves
    #[default]
    Half = 0,
    /// Swap bytes within 32-bit words
    Word = 1,
    /// Swap bytes within 64-bit double words
    DoubleWord = 2,
    /// Swap 32-bit words within 64-bit double words
    WordPairs = 3,
}

/// Header mode parameters (RX only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeaderMode {
    /// Header length in bytes; ignored in checksum mode
    pub len: u16,
    /// Checksum mode
    pub checksum: bool,
}

impl HeaderMode {
    /// Header split at `len` bytes
    #[must_use]
    pub const fn split(len: u16) -> Self {
        Self { len, checksum: false }
    }

    /// Checksum mode
    #[must_use]
    pub const fn checksum() -> Self {
        Self { len: 0, checksum: true }
    }

    /// True if the length is acceptable for the selected mode
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.checksum || (self.len > 0 && self.len <= MAX_HEADER_LEN)
    }
}

/// A descriptor block supplied outside the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorBase {
    /// Bus address of the first descriptor
    pub addr: u64,
    /// Number of descriptors
    pub count: u16,
}

impl DescriptorBase {
    /// Create a descriptor block reference
    #[must_use]
    pub const fn new(addr: u64, count: u16) -> Self {
        Self { addr, count }
    }

    /// Check count and address against the hardware limits
    pub fn validate(&self, caps: &Capabilities) -> ConfigResult<()> {
        if self.count == 0 || self.count > MAX_DESCRIPTOR_COUNT {
            return Err(ConfigError::InvalidDescriptorCount);
        }
        if self.addr % DESCRIPTOR_SIZE as u64 != 0 {
            return Err(ConfigError::InvalidAddress);
        }
        let span = u64::from(self.count) * DESCRIPTOR_SIZE as u64 - 1;
        match self.addr.checked_add(span) {
            Some(end) if end <= caps.max_bus_addr() => Ok(()),
            _ => Err(ConfigError::InvalidAddress),
        }
    }
}

/// Caller-supplied channel control bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelControl {
    /// Prefetch descriptors
    pub prefetch: bool,
    /// Stop the channel when a descriptor error is reported
    pub stop_on_error: bool,
    /// Process descriptors strictly in order
    pub strict_order: bool,
}

impl ChannelControl {
    /// Encode as control register bits
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        let mut bits = 0;
        if self.prefetch {
            bits |= CH_CTRL_PREFETCH;
        }
        if self.stop_on_error {
            bits |= CH_CTRL_STOP_ON_ERROR;
        }
        if self.strict_order {
            bits |= CH_CTRL_STRICT_ORDER;
        }
        bits
    }
}

/// Per-channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Index of the owning port
    pub port: u8,
    /// Control bits applied at configure time
    pub control: ChannelControl,
    /// Class/priority; `None` keeps the value found in hardware
    pub class: Option<u8>,
    /// Polling ticks; `None` disables per-channel polling
    pub poll_ticks: Option<PollTicks>,
    /// Byte offset length (RX only); 0 disables
    pub byte_offset: u8,
    /// Data endian swap
    pub data_swap: Option<SwapType>,
    /// Descriptor endian swap
    pub desc_swap: Option<SwapType>,
    /// Header mode (RX only)
    pub header: Option<HeaderMode>,
    /// Non-posted writes (RX only)
    pub write_non_posted: bool,
    /// Adaptive burst chop (TX only)
    pub adaptive_chop: bool,
    /// Descriptor block supplied by the platform
    pub hw_descriptors: Option<DescriptorBase>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelConfig {
    /// Channel on port 0 with every optional feature off
    #[must_use]
    pub const fn new() -> Self {
        Self {
            port: 0,
            control: ChannelControl {
                prefetch: false,
                stop_on_error: false,
                strict_order: false,
            },
            class: None,
            poll_ticks: None,
            byte_offset: 0,
            data_swap: None,
            desc_swap: None,
            header: None,
            write_non_posted: false,
            adaptive_chop: false,
            hw_descriptors: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the owning port
    #[must_use]
    pub const fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Set the control bits
    #[must_use]
    pub const fn with_control(mut self, control: ChannelControl) -> Self {
        self.control = control;
        self
    }

    /// Set the class/priority
    #[must_use]
    pub const fn with_class(mut self, class: u8) -> Self {
        self.class = Some(class);
        self
    }

    /// Set the polling tick pair
    #[must_use]
    pub const fn with_poll_ticks(mut self, arb: u16, non_arb: u16) -> Self {
        self.poll_ticks = Some(PollTicks::new(arb, non_arb));
        self
    }

    /// Set the byte offset length
    #[must_use]
    pub const fn with_byte_offset(mut self, len: u8) -> Self {
        self.byte_offset = len;
        self
    }

    /// Enable data endian swap
    #[must_use]
    pub const fn with_data_swap(mut self, swap: SwapType) -> Self {
        self.data_swap = Some(swap);
        self
    }

    /// Enable descriptor endian swap
    #[must_use]
    pub const fn with_desc_swap(mut self, swap: SwapType) -> Self {
        self.desc_swap = Some(swap);
        self
    }

    /// Set header mode
    #[must_use]
    pub const fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = Some(header);
        self
    }

    /// Enable non-posted writes
    #[must_use]
    pub const fn with_write_non_posted(mut self, enabled: bool) -> Self {
        self.write_non_posted = enabled;
        self
    }

    /// Enable adaptive burst chop
    #[must_use]
    pub const fn with_adaptive_chop(mut self, enabled: bool) -> Self {
        self.adaptive_chop = enabled;
        self
    }

    /// Use a platform-supplied descriptor block
    #[must_use]
    pub const fn with_hw_descriptors(mut self, addr: u64, count: u16) -> Self {
        self.hw_descriptors = Some(DescriptorBase::new(addr, count));
        self
    }

    /// Reject out-of-range values
    pub fn validate(&self, caps: &Capabilities) -> ConfigResult<()> {
        if self.port >= caps.port_count {
            return Err(ConfigError::InvalidPort);
        }
        if let Some(class) = self.class {
            if class > MAX_CLASS {
                return Err(ConfigError::InvalidClass);
            }
        }
        if let Some(ticks) = self.poll_ticks {
            if !ticks.is_ordered() {
                return Err(ConfigError::InvalidPollTicks);
            }
        }
        if let Some(header) = self.header {
            if !header.is_valid() {
                return Err(ConfigError::InvalidHeaderLength);
            }
        }
        if let Some(base) = self.hw_descriptors {
            base.validate(caps)?;
        }
        Ok(())
    }
}

// =============================================================================
// Port Parameters
// =============================================================================

/// Per-port configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig {
    /// RX burst length; `None` uses the revision default
    pub rx_burst: Option<BurstLen>,
    /// TX burst length; `None` uses the revision default
    pub tx_burst: Option<BurstLen>,
    /// RX endian-swap index (0..=7)
    pub rx_endian: u8,
    /// TX endian-swap index (0..=7)
    pub tx_endian: u8,
    /// Drop packets on congestion (newer revisions only)
    pub drop_on_congestion: bool,
}

impl PortConfig {
    /// Port with default bursts and no swapping
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx_burst: None,
            tx_burst: None,
            rx_endian: 0,
            tx_endian: 0,
            drop_on_congestion: false,
        }
    }

    /// Set both burst lengths
    #[must_use]
    pub const fn with_bursts(mut self, rx: BurstLen, tx: BurstLen) -> Self {
        self.rx_burst = Some(rx);
        self.tx_burst = Some(tx);
        self
    }

    /// Set both endian-swap indices
    #[must_use]
    pub const fn with_endian(mut self, rx: u8, tx: u8) -> Self {
        self.rx_endian = rx;
        self.tx_endian = tx;
        self
    }

    /// Enable packet drop on congestion
    #[must_use]
    pub const fn with_drop_on_congestion(mut self, enabled: bool) -> Self {
        self.drop_on_congestion = enabled;
        self
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rx_endian > MAX_ENDIAN_INDEX || self.tx_endian > MAX_ENDIAN_INDEX {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

// =============================================================================
// Global Parameters
// =============================================================================

/// Controller-wide feature switches
///
/// Each switch is further gated by the capability model; turning on a
/// feature the instance lacks has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlobalFeatures {
    /// Channel arbitration
    pub arbitration: bool,
    /// Global descriptor polling
    pub polling: bool,
    /// Byte-enable qualified writes
    pub byte_enable: bool,
    /// Descriptor read buffer
    pub drb: bool,
    /// Per-channel flow control
    pub flow_control: bool,
    /// Fetch descriptors on demand
    pub fetch_on_demand: bool,
    /// Descriptors in controller SRAM
    pub sram_descriptors: bool,
    /// Double burst write
    pub double_burst_write: bool,
    /// Valid descriptor fetch acknowledgement
    pub valid_fetch_ack: bool,
    /// 36-bit addressing
    pub addressing_36bit: bool,
    /// 128-bit data path
    pub data_128bit: bool,
}

impl GlobalFeatures {
    /// Every feature requested
    pub const ALL: Self = Self {
        arbitration: true,
        polling: true,
        byte_enable: true,
        drb: true,
        flow_control: true,
        fetch_on_demand: true,
        sram_descriptors: true,
        double_burst_write: true,
        valid_fetch_ack: true,
        addressing_36bit: true,
        data_128bit: true,
    };

    /// No feature requested
    pub const NONE: Self = Self {
        arbitration: false,
        polling: false,
        byte_enable: false,
        drb: false,
        flow_control: false,
        fetch_on_demand: false,
        sram_descriptors: false,
        double_burst_write: false,
        valid_fetch_ack: false,
        addressing_36bit: false,
        data_128bit: false,
    };
}

impl Default for GlobalFeatures {
    fn default() -> Self {
        Self::ALL
    }
}

/// Complete controller configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Engine kind of the instance
    pub kind: InstanceKind,
    /// Silicon revision
    pub revision: Revision,
    /// Bit N set means channel N is brought up
    pub active_channels: u32,
    /// Global feature switches
    pub features: GlobalFeatures,
    /// Global polling count; `None` uses the revision default
    pub poll_count: Option<u16>,
    /// Descriptor fetch timeout; `None` leaves the feature off
    pub descriptor_timeout: Option<u16>,
    /// Outstanding read request limit
    pub outstanding_reads: Option<u8>,
    /// Resource-pool offset table
    pub resource_pool_offsets: [u16; RESOURCE_POOL_SLOTS],
    /// Number of valid entries in `resource_pool_offsets`
    pub resource_pool_len: usize,
    /// Ring size carved per channel in legacy ring mode
    pub descriptors_per_channel: u16,
    /// Port table
    pub ports: [PortConfig; MAX_PORTS],
    /// Per-channel configuration, indexed by channel number
    pub channels: [ChannelConfig; MAX_CHANNELS],
    rejected: Option<ConfigError>,
}

impl ControllerConfig {
    /// Configuration with no active channels and default settings
    #[must_use]
    pub const fn new(kind: InstanceKind, revision: Revision) -> Self {
        Self {
            kind,
            revision,
            active_channels: 0,
            features: GlobalFeatures::ALL,
            poll_count: None,
            descriptor_timeout: None,
            outstanding_reads: None,
            resource_pool_offsets: [0; RESOURCE_POOL_SLOTS],
            resource_pool_len: 0,
            descriptors_per_channel: DEFAULT_DESCRIPTORS_PER_CHANNEL,
            ports: [PortConfig::new(); MAX_PORTS],
            channels: [ChannelConfig::new(); MAX_CHANNELS],
            rejected: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the active channel mask
    #[must_use]
    pub const fn with_active_channels(mut self, mask: u32) -> Self {
        self.active_channels = mask;
        self
    }

    /// Set the global feature switches
    #[must_use]
    pub const fn with_features(mut self, features: GlobalFeatures) -> Self {
        self.features = features;
        self
    }

    /// Set the global polling count
    #[must_use]
    pub const fn with_poll_count(mut self, count: u16) -> Self {
        self.poll_count = Some(count);
        self
    }

    /// Enable the descriptor fetch timeout
    #[must_use]
    pub const fn with_descriptor_timeout(mut self, timeout: u16) -> Self {
        self.descriptor_timeout = Some(timeout);
        self
    }

    /// Set the outstanding read request limit
    #[must_use]
    pub const fn with_outstanding_reads(mut self, count: u8) -> Self {
        self.outstanding_reads = Some(count);
        self
    }

    /// Set the resource-pool offset table
    #[must_use]
    pub const fn with_resource_pool_offsets(mut self, offsets: &[u16]) -> Self {
        if offsets.len() > RESOURCE_POOL_SLOTS {
            self.rejected = Some(ConfigError::InvalidConfig);
            return self;
        }
        let mut i = 0;
        while i < offsets.len() {
            self.resource_pool_offsets[i] = offsets[i];
            i += 1;
        }
        self.resource_pool_len = offsets.len();
        self
    }

    /// Set the ring size carved per channel in legacy ring mode
    #[must_use]
    pub const fn with_descriptors_per_channel(mut self, count: u16) -> Self {
        self.descriptors_per_channel = count;
        self
    }

    /// Configure one port
    #[must_use]
    pub const fn with_port(mut self, index: u8, port: PortConfig) -> Self {
        if index as usize >= MAX_PORTS {
            self.rejected = Some(ConfigError::InvalidPort);
            return self;
        }
        self.ports[index as usize] = port;
        self
    }

    /// Configure one channel and mark it active
    #[must_use]
    pub const fn with_channel(mut self, index: u8, channel: ChannelConfig) -> Self {
        if index as usize >= MAX_CHANNELS {
            self.rejected = Some(ConfigError::InvalidChannel);
            return self;
        }
        self.channels[index as usize] = channel;
        self.active_channels |= 1u32 << index;
        self
    }

    /// Capabilities of the configured instance
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        Capabilities::lookup(self.kind, self.revision)
    }

    /// Reject malformed values before anything touches the hardware
    pub fn validate(&self) -> ConfigResult<Capabilities> {
        if let Some(err) = self.rejected {
            return Err(err);
        }
        let caps = self.capabilities();

        let usable = if caps.channel_count as usize >= MAX_CHANNELS {
            u32::MAX
        } else {
            (1u32 << caps.channel_count) - 1
        };
        if self.active_channels & !usable != 0 {
            return Err(ConfigError::InvalidChannel);
        }
        if self.resource_pool_len > RESOURCE_POOL_SLOTS {
            return Err(ConfigError::InvalidConfig);
        }
        if caps.is_legacy()
            && (self.descriptors_per_channel == 0
                || self.descriptors_per_channel > MAX_DESCRIPTOR_COUNT)
        {
            return Err(ConfigError::InvalidDescriptorCount);
        }
        for port in &self.ports[..caps.port_count as usize] {
            port.validate()?;
        }
        for (index, channel) in self.channels.iter().enumerate() {
            if self.active_channels & (1u32 << index) != 0 {
                channel.validate(&caps)?;
            }
        }
        Ok(caps)
    }

    /// Iterate over active channel numbers
    pub fn active(&self) -> impl Iterator<Item = u8> + '_ {
        (0..MAX_CHANNELS as u8).filter(move |ch| self.active_channels & (1u32 << ch) != 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
