//! DMA Controller
//!
//! Top-level object for one controller instance. It owns the channel and
//! port tables, brings the hardware up, accepts scatter-gather submissions,
//! runs deferred completion work and exposes the diagnostic dumps.
//!
//! # Descriptor modes
//!
//! - **Legacy ring** (oldest revision): the controller carves a ring per
//!   active channel out of a caller-provided [`DescriptorRegion`]. Each
//!   submission becomes a descriptor chain in that ring. One transfer is
//!   armed at a time; the next is armed from
//!   [`process_completions`](Controller::process_completions) once the
//!   previous one has been reported.
//! - **Direct** (newer revisions): the caller owns the descriptors. A
//!   submission is a single fragment naming a descriptor block, or no
//!   fragment at all to run the block supplied by the device configuration.
//!   Completion is channel-level.
//!
//! # Example
//!
//! ```ignore
//! static REGS: DmaRegisters<MmioBus> = DmaRegisters::new(unsafe { MmioBus::new(DMA_BASE) });
//! static COMPLETIONS: CompletionQueue = CompletionQueue::new();
//!
//! let config = ControllerConfig::new(InstanceKind::Tx, Revision::Gen4)
//!     .with_channel(3, ChannelConfig::new().with_class(5));
//! let mut dma = Controller::new(&REGS, &COMPLETIONS, delay, config, None)?;
//! let report = dma.init()?;
//!
//! let cookie = dma.submit_sg(3, &[Fragment::new(block, 64 * 16)], Direction::Tx, Some(&client))?;
//! dma.issue_pending(3)?;
//!
//! // after the interrupt handler ran
//! dma.process_completions();
//! ```

#[cfg(feature = "log")]
use log::{debug, warn};

use embedded_hal::delay::DelayNs;

use crate::driver::capability::{BurstLen, Capabilities};
use crate::driver::channel::{Apply, Channel, ChannelOption, ChannelRegisterDump, Direction};
use crate::driver::config::{
    ChannelConfig, ControllerConfig, DescriptorBase, HeaderMode, PollTicks, SwapType,
};
use crate::driver::error::{ConfigError, ConfigResult, DmaError, Error, IoError, Result};
use crate::driver::port::Port;
use crate::driver::transfer::{Completion, Cookie, Fragment, TransferCallback, TransferStatus};
use crate::hal::reset::ResetController;
use crate::internal::constants::{
    DESCRIPTOR_SIZE, MAX_CHANNELS, MAX_DESCRIPTOR_COUNT, MAX_PORTS, MAX_QUEUED_TRANSFERS,
    RESOURCE_POOL_SLOTS,
};
use crate::internal::dma::{
    Chain, DescriptorRing, HwDescriptor, SwDescriptor, SwState, TransferQueue,
};
use crate::internal::register::channel::{CH_IRQ_COMPLETE, CH_IRQ_DESC_TIMEOUT, CH_IRQ_ERROR};
use crate::internal::register::global::*;
use crate::internal::register::{DmaRegisters, RegisterBus};
use crate::sync::CompletionQueue;

// =============================================================================
// Descriptor Memory
// =============================================================================

/// Descriptor memory handed to the controller for legacy ring mode
///
/// The slice must be DMA-coherent and visible to the controller at
/// `bus_addr`. It is split evenly between active channels in channel order.
#[derive(Clone, Copy)]
pub struct DescriptorRegion<'a> {
    descriptors: &'a [HwDescriptor],
    bus_addr: u64,
}

impl<'a> DescriptorRegion<'a> {
    /// Wrap descriptor memory located at `bus_addr`
    pub const fn new(descriptors: &'a [HwDescriptor], bus_addr: u64) -> Self {
        Self {
            descriptors,
            bus_addr,
        }
    }

    /// Number of descriptors in the region
    pub const fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True for an empty region
    pub const fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn validate(&self, caps: &Capabilities, needed: usize) -> ConfigResult<()> {
        if self.is_empty() || needed > self.len() {
            return Err(ConfigError::InvalidDescriptorCount);
        }
        if self.bus_addr % DESCRIPTOR_SIZE as u64 != 0 {
            return Err(ConfigError::InvalidAddress);
        }
        let end = self.bus_addr + (self.len() * DESCRIPTOR_SIZE) as u64 - 1;
        if end > caps.max_bus_addr() {
            return Err(ConfigError::InvalidAddress);
        }
        Ok(())
    }

    fn carve(&self, ordinal: usize, per_channel: usize) -> Option<DescriptorRing<'a>> {
        let start = ordinal * per_channel;
        let slice = self.descriptors.get(start..start + per_channel)?;
        Some(DescriptorRing::new(
            slice,
            self.bus_addr + (start * DESCRIPTOR_SIZE) as u64,
        ))
    }
}

// =============================================================================
// Reports and Dumps
// =============================================================================

/// Outcome of [`Controller::init`]
///
/// A channel that fails to configure is reported here and left unusable;
/// the other channels are brought up regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BringUpReport {
    /// Channels configured successfully
    pub configured: u32,
    /// Channels whose configuration failed
    pub failed: u32,
    errors: [Option<Error>; MAX_CHANNELS],
}

impl BringUpReport {
    /// True if every active channel came up
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Why `channel` failed, if it did
    pub fn error(&self, channel: u8) -> Option<Error> {
        self.errors.get(channel as usize).copied().flatten()
    }

    fn record(&mut self, channel: u8, error: Error) {
        self.failed |= 1u32 << channel;
        self.errors[channel as usize] = Some(error);
    }
}

/// One ring descriptor as seen by the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorSnapshot {
    /// Ring index
    pub index: usize,
    /// Bus address of the descriptor itself
    pub bus_addr: u64,
    /// Buffer bus address
    pub buffer_addr: u64,
    /// Next descriptor bus address
    pub next_addr: u64,
    /// Segment length
    pub len: u32,
    /// Raw control word
    pub control: u32,
    /// Owned by the controller
    pub owned: bool,
    /// Start of packet
    pub first: bool,
    /// End of packet
    pub last: bool,
}

/// Global register snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlobalConfigDump {
    /// REVISION
    pub revision: u32,
    /// CONFIG
    pub config: u32,
    /// POLL_COUNT
    pub poll_count: u32,
    /// IRQ_MASK
    pub irq_mask: u32,
    /// IRQ_CAUSE
    pub irq_cause: u32,
    /// DESC_TIMEOUT
    pub desc_timeout: u32,
    /// ORRC
    pub outstanding_reads: u32,
    /// Resource-pool offset table
    pub resource_pool: [u32; RESOURCE_POOL_SLOTS],
    /// PORT_CTRL of each port, zero past the port count
    pub ports: [u32; MAX_PORTS],
}

// =============================================================================
// Channel Slot
// =============================================================================

struct ChannelSlot<'a> {
    hw: Channel,
    ring: DescriptorRing<'a>,
    queue: TransferQueue<SwDescriptor<'a>, MAX_QUEUED_TRANSFERS>,
    standing: Option<DescriptorBase>,
    last_submitted: Cookie,
    issued: Cookie,
    paused: bool,
}

impl ChannelSlot<'_> {
    fn new(index: u8) -> Self {
        Self {
            hw: Channel::new(index),
            ring: DescriptorRing::empty(),
            queue: TransferQueue::new(),
            standing: None,
            last_submitted: Cookie::NONE,
            issued: Cookie::NONE,
            paused: false,
        }
    }

    fn front(&self) -> Option<(SwState, Cookie, Chain)> {
        self.queue.front().map(|d| (d.state, d.cookie, d.chain))
    }

    fn is_queued(&self, cookie: Cookie) -> bool {
        self.queue.iter().any(|d| d.cookie == cookie)
    }
}

fn irq_mask(caps: &Capabilities) -> u32 {
    let mut mask = CH_IRQ_COMPLETE | CH_IRQ_ERROR;
    if caps.descriptor_timeout {
        mask |= CH_IRQ_DESC_TIMEOUT;
    }
    mask
}

/// Capabilities narrowed to what the configuration switches on
fn effective_capabilities(caps: Capabilities, config: &ControllerConfig) -> Capabilities {
    let f = &config.features;
    Capabilities {
        flow_control: caps.flow_control && f.flow_control,
        fetch_on_demand: caps.fetch_on_demand && f.fetch_on_demand,
        sram_descriptors: caps.sram_descriptors && f.sram_descriptors,
        double_burst_write: caps.double_burst_write && f.double_burst_write,
        valid_fetch_ack: caps.valid_fetch_ack && f.valid_fetch_ack,
        addressing_36bit: caps.addressing_36bit && f.addressing_36bit,
        data_128bit: caps.data_128bit && f.data_128bit,
        descriptor_timeout: caps.descriptor_timeout && config.descriptor_timeout.is_some(),
        resource_pool_offsets: caps.resource_pool_offsets && config.resource_pool_len > 0,
        outstanding_reads: caps.outstanding_reads && config.outstanding_reads.is_some(),
        ..caps
    }
}

/// Put the front transfer on the hardware if it is still only prepared
fn arm<B: RegisterBus, D: DelayNs>(
    slot: &mut ChannelSlot<'_>,
    regs: &DmaRegisters<B>,
    caps: &Capabilities,
    delay: &mut D,
) -> Result<()> {
    let Some((SwState::Prepared, _, chain)) = slot.front() else {
        return Ok(());
    };

    if caps.is_legacy() {
        if !slot.hw.desc_init() {
            let (base, len) = (slot.ring.bus_addr(), slot.ring.len() as u16);
            slot.hw.set_desc_base(regs, caps, base, len)?;
        }
        let tail = (chain.first + chain.count) % slot.ring.len();
        slot.hw.set_tail(regs, tail as u32);
    } else {
        if slot.hw.is_on() {
            slot.hw.turn_off(regs, caps, delay)?;
        }
        if chain.count > 0 {
            let addr = slot.queue.front().map_or(0, |d| d.block_addr);
            slot.hw.set_desc_base(regs, caps, addr, chain.count as u16)?;
        } else if let Some(base) = slot.standing {
            // A previous block may have replaced the standing base
            slot.hw.set_desc_base(regs, caps, base.addr, base.count)?;
        }
    }

    if !slot.hw.is_on() {
        slot.hw.turn_on(regs)?;
    }
    if let Some(front) = slot.queue.front_mut() {
        front.state = SwState::Active;
    }
    Ok(())
}

// =============================================================================
// Controller
// =============================================================================

/// One DMA controller instance
///
/// Borrows the register block and the completion queue so that an
/// [`InterruptDispatcher`](crate::InterruptDispatcher) can share them from
/// interrupt context.
pub struct Controller<'a, B: RegisterBus, D: DelayNs> {
    regs: &'a DmaRegisters<B>,
    completions: &'a CompletionQueue,
    delay: D,
    config: ControllerConfig,
    caps: Capabilities,
    ports: [Port; MAX_PORTS],
    slots: [ChannelSlot<'a>; MAX_CHANNELS],
    initialized: bool,
}

impl<'a, B: RegisterBus, D: DelayNs> Controller<'a, B, D> {
    /// Validate `config` and set up the channel and port tables
    ///
    /// Nothing is written to the controller registers here. In legacy ring
    /// mode `region` is required and must hold `descriptors_per_channel`
    /// descriptors for every active channel.
    pub fn new(
        regs: &'a DmaRegisters<B>,
        completions: &'a CompletionQueue,
        delay: D,
        config: ControllerConfig,
        region: Option<DescriptorRegion<'a>>,
    ) -> Result<Self> {
        let caps = effective_capabilities(config.validate()?, &config);
        let mut slots: [ChannelSlot<'a>; MAX_CHANNELS] =
            core::array::from_fn(|i| ChannelSlot::new(i as u8));

        if caps.is_legacy() {
            let region = region.ok_or(ConfigError::InvalidConfig)?;
            let per_channel = config.descriptors_per_channel as usize;
            let active = config.active_channels.count_ones() as usize;
            region.validate(&caps, active * per_channel)?;
            for (ordinal, ch) in config.active().enumerate() {
                slots[ch as usize].ring = region
                    .carve(ordinal, per_channel)
                    .ok_or(ConfigError::InvalidDescriptorCount)?;
            }
        }
        for ch in config.active() {
            slots[ch as usize].standing = config.channels[ch as usize].hw_descriptors;
        }

        let ports = core::array::from_fn(|i| Port::new(i as u8, config.ports[i]));

        Ok(Self {
            regs,
            completions,
            delay,
            config,
            caps,
            ports,
            slots,
            initialized: false,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Capabilities in effect (revision table narrowed by the configuration)
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Configuration the controller was created with
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// True once [`init`](Self::init) has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Channel state for `ch`
    pub fn channel(&self, ch: u8) -> Result<&Channel> {
        let i = self.check(ch)?;
        Ok(&self.slots[i].hw)
    }

    /// Port `index`
    pub fn port(&self, index: u8) -> Option<&Port> {
        self.ports[..self.caps.port_count as usize].get(index as usize)
    }

    /// Transfers queued on `ch`, armed or not
    pub fn pending_transfers(&self, ch: u8) -> Result<usize> {
        let i = self.check(ch)?;
        Ok(self.slots[i].queue.len())
    }

    /// Interrupts that found no cause bit set
    pub fn spurious_interrupts(&self) -> u32 {
        self.completions.spurious_count()
    }

    fn check(&self, ch: u8) -> Result<usize> {
        if !self.initialized {
            return Err(IoError::InvalidState.into());
        }
        if ch as usize >= MAX_CHANNELS || self.config.active_channels & (1u32 << ch) == 0 {
            return Err(ConfigError::InvalidChannel.into());
        }
        Ok(ch as usize)
    }

    // =========================================================================
    // Bring-up
    // =========================================================================

    /// Reset the controller and configure it
    ///
    /// In order: functional reset, global feature configuration, every port,
    /// every active channel. A channel that fails is recorded in the report
    /// and left out of the interrupt mask; the rest still come up.
    pub fn init(&mut self) -> Result<BringUpReport> {
        if self.initialized {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        let regs = self.regs;
        let caps = self.caps;

        ResetController::new(regs).functional_reset(&mut self.delay);
        self.apply_global_config();
        for port in &self.ports[..caps.port_count as usize] {
            port.configure(regs, &caps);
        }

        let mut report = BringUpReport::default();
        for ch in 0..MAX_CHANNELS as u8 {
            if self.config.active_channels & (1u32 << ch) == 0 {
                continue;
            }
            let config = self.config.channels[ch as usize];
            let slot = &mut self.slots[ch as usize];
            match Self::bring_up_channel(slot, regs, &caps, &config) {
                Ok(()) => report.configured |= 1u32 << ch,
                Err(e) => {
                    #[cfg(feature = "log")]
                    warn!("ch{}: bring-up failed: {}", ch, e);
                    report.record(ch, e);
                }
            }
        }

        regs.write(IRQ_MASK_OFFSET, report.configured);
        self.initialized = true;

        #[cfg(feature = "log")]
        debug!(
            "DMA up: configured {:#010x} failed {:#010x}",
            report.configured, report.failed
        );
        Ok(report)
    }

    fn bring_up_channel(
        slot: &mut ChannelSlot<'_>,
        regs: &DmaRegisters<B>,
        caps: &Capabilities,
        config: &ChannelConfig,
    ) -> Result<()> {
        slot.hw.configure(regs, caps, config)?;
        if caps.is_legacy() {
            let (base, len) = (slot.ring.bus_addr(), slot.ring.len() as u16);
            slot.hw.set_desc_base(regs, caps, base, len)?;
        }
        Ok(())
    }

    fn apply_global_config(&self) {
        let regs = self.regs;
        let caps = &self.caps;
        let features = &self.config.features;
        let mut value = 0;

        if features.arbitration {
            value |= CONFIG_ARB_EN;
        }
        if features.polling {
            let count = self.config.poll_count.unwrap_or(caps.default_poll_count);
            regs.write(POLL_COUNT_OFFSET, u32::from(count) & POLL_COUNT_MASK);
            value |= CONFIG_POLL_EN;
        }
        if features.byte_enable {
            value |= CONFIG_BYTE_EN;
        }
        if features.drb {
            value |= CONFIG_DRB;
        }
        if caps.flow_control {
            value |= CONFIG_CH_FLOW_CTRL;
        }
        if caps.fetch_on_demand {
            value |= CONFIG_FETCH_ON_DEMAND;
        }
        if caps.sram_descriptors {
            value |= CONFIG_SRAM_DESC;
        }
        if caps.double_burst_write {
            value |= CONFIG_DOUBLE_BURST_WR;
        }
        if caps.valid_fetch_ack {
            value |= CONFIG_VALID_FETCH_ACK;
        }
        if caps.addressing_36bit {
            value |= CONFIG_ADDR_36BIT;
        }
        if caps.data_128bit {
            value |= CONFIG_DATA_128BIT;
        }
        if let (true, Some(timeout)) = (caps.descriptor_timeout, self.config.descriptor_timeout) {
            regs.write(DESC_TIMEOUT_OFFSET, u32::from(timeout) & DESC_TIMEOUT_MASK);
            value |= CONFIG_DESC_TIMEOUT_EN;
        }
        if caps.resource_pool_offsets {
            let len = self.config.resource_pool_len;
            for (i, offset) in self.config.resource_pool_offsets[..len].iter().enumerate() {
                regs.write(res_pool_offset(i), u32::from(*offset) & RES_POOL_ENTRY_MASK);
            }
            value |= CONFIG_RES_POOL_EN;
        }
        if let (true, Some(count)) = (caps.outstanding_reads, self.config.outstanding_reads) {
            regs.write(ORRC_OFFSET, u32::from(count) & ORRC_MASK);
        }

        regs.write(CONFIG_OFFSET, value);
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Queue a scatter-gather transfer on `ch`
    ///
    /// The transfer is prepared but not started; call
    /// [`issue_pending`](Self::issue_pending). `direction` must match the
    /// channel's hardware direction. `callback` runs once from
    /// [`process_completions`](Self::process_completions) when the transfer
    /// finishes.
    pub fn submit_sg(
        &mut self,
        ch: u8,
        fragments: &[Fragment],
        direction: Direction,
        callback: Option<&'a dyn TransferCallback>,
    ) -> Result<Cookie> {
        let i = self.check(ch)?;
        let caps = self.caps;
        let slot = &mut self.slots[i];

        if slot.hw.direction() != direction {
            return Err(ConfigError::UnsupportedDirection.into());
        }
        if slot.queue.is_full() {
            return Err(DmaError::TooManyTransfers.into());
        }

        let (chain, block_addr) = if caps.is_legacy() {
            Self::check_reachable(fragments, &caps)?;
            let chain = slot.ring.write_chain(fragments)?;
            (chain, slot.ring.bus_addr_of(chain.first))
        } else {
            Self::direct_block(slot, fragments, &caps)?
        };

        let cookie = slot.last_submitted.next();
        slot.queue
            .push(SwDescriptor {
                cookie,
                chain,
                block_addr,
                callback,
                state: SwState::Prepared,
            })
            .map_err(|_| DmaError::TooManyTransfers)?;
        slot.last_submitted = cookie;
        Ok(cookie)
    }

    /// Every buffer must lie below the highest address the controller reaches
    fn check_reachable(fragments: &[Fragment], caps: &Capabilities) -> ConfigResult<()> {
        for frag in fragments.iter().filter(|f| f.len > 0) {
            let end = frag.addr.checked_add(u64::from(frag.len) - 1);
            if end.is_none_or(|end| end > caps.max_bus_addr()) {
                return Err(ConfigError::InvalidAddress);
            }
        }
        Ok(())
    }

    fn direct_block(
        slot: &ChannelSlot<'_>,
        fragments: &[Fragment],
        caps: &Capabilities,
    ) -> Result<(Chain, u64)> {
        match fragments {
            [] => {
                let base = slot.standing.ok_or(DmaError::UnsupportedTransfer)?;
                Ok((Chain { first: 0, count: 0, bytes: 0 }, base.addr))
            }
            [block] => {
                if block.len == 0 || block.len as usize % DESCRIPTOR_SIZE != 0 {
                    return Err(DmaError::InvalidLength.into());
                }
                let count = block.len as usize / DESCRIPTOR_SIZE;
                if count > MAX_DESCRIPTOR_COUNT as usize {
                    return Err(ConfigError::InvalidDescriptorCount.into());
                }
                DescriptorBase::new(block.addr, count as u16).validate(caps)?;
                let chain = Chain {
                    first: 0,
                    count,
                    bytes: block.len,
                };
                Ok((chain, block.addr))
            }
            _ => Err(DmaError::UnsupportedTransfer.into()),
        }
    }

    /// Mark everything submitted so far as issued and arm the oldest
    /// transfer if the channel is idle
    pub fn issue_pending(&mut self, ch: u8) -> Result<()> {
        let i = self.check(ch)?;
        let caps = self.caps;
        let slot = &mut self.slots[i];
        slot.issued = slot.last_submitted;
        if slot.paused {
            return Ok(());
        }
        arm(slot, self.regs, &caps, &mut self.delay)
    }

    /// Progress of transfer `cookie` on `ch`
    pub fn status(&self, ch: u8, cookie: Cookie) -> Result<TransferStatus> {
        let i = self.check(ch)?;
        let slot = &self.slots[i];
        if cookie == Cookie::NONE
            || slot.last_submitted == Cookie::NONE
            || !cookie.is_at_or_before(slot.last_submitted)
        {
            return Err(IoError::UnknownTransfer.into());
        }
        Ok(match (slot.is_queued(cookie), slot.paused) {
            (false, _) => TransferStatus::Complete,
            (true, true) => TransferStatus::Paused,
            (true, false) => TransferStatus::InProgress,
        })
    }

    /// Stop `ch`, reset it, and discard every queued transfer
    ///
    /// Returns the number of transfers discarded; their callbacks are not
    /// invoked. Descriptor memory is only released once the reset has been
    /// confirmed; on timeout nothing is discarded.
    pub fn terminate_all(&mut self, ch: u8) -> Result<usize> {
        let i = self.check(ch)?;
        let caps = self.caps;
        let regs = self.regs;
        let slot = &mut self.slots[i];

        slot.hw.reset(regs, &caps, &mut self.delay)?;
        slot.hw.clear_irq_cause(regs);

        let discarded = slot.queue.len();
        slot.queue.clear();
        if !slot.ring.is_empty() {
            slot.ring.reset();
        }
        slot.issued = slot.last_submitted;
        slot.paused = false;
        Ok(discarded)
    }

    /// Stop `ch` without resetting it
    pub fn pause(&mut self, ch: u8) -> Result<()> {
        let i = self.check(ch)?;
        let caps = self.caps;
        let slot = &mut self.slots[i];
        if slot.hw.is_on() {
            slot.hw.turn_off(self.regs, &caps, &mut self.delay)?;
        }
        slot.paused = true;
        Ok(())
    }

    /// Restart `ch` after [`pause`](Self::pause)
    pub fn resume(&mut self, ch: u8) -> Result<()> {
        let i = self.check(ch)?;
        let caps = self.caps;
        let slot = &mut self.slots[i];
        slot.paused = false;
        match slot.front() {
            Some((SwState::Active, _, _)) if !slot.hw.is_on() => slot.hw.turn_on(self.regs),
            Some((SwState::Prepared, cookie, _)) if cookie.is_at_or_before(slot.issued) => {
                arm(slot, self.regs, &caps, &mut self.delay)
            }
            _ => Ok(()),
        }
    }

    /// Change the burst lengths of the port that owns `ch`
    ///
    /// Affects every channel on that port. Returns the port register read
    /// back after the write.
    pub fn set_slave_config(&mut self, ch: u8, rx_burst: BurstLen, tx_burst: BurstLen) -> Result<u32> {
        let i = self.check(ch)?;
        let index = self.slots[i].hw.port() as usize;
        let port = self.ports[..self.caps.port_count as usize]
            .get_mut(index)
            .ok_or(ConfigError::InvalidPort)?;
        port.set_bursts(rx_burst, tx_burst);
        Ok(port.configure(self.regs, &self.caps))
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Deferred completion work
    ///
    /// Takes every channel the interrupt handler scheduled, reports finished
    /// transfers in submission order, arms the next issued transfer and
    /// re-enables the channel interrupt. Returns the number of callbacks
    /// invoked. Call from thread context, never from the interrupt handler.
    pub fn process_completions(&mut self) -> usize {
        let pending = self.completions.take();
        let mut delivered = 0;
        for ch in 0..MAX_CHANNELS as u8 {
            if pending & (1u32 << ch) != 0 && self.check(ch).is_ok() {
                delivered += self.complete_channel(ch);
            }
        }
        delivered
    }

    fn complete_channel(&mut self, ch: u8) -> usize {
        let regs = self.regs;
        let caps = self.caps;
        let legacy = caps.is_legacy();
        let slot = &mut self.slots[ch as usize];

        let cause = if legacy {
            slot.hw.clear_irq_cause(regs)
        } else {
            regs.with_channel(ch, |w| {
                let cause = w.irq_cause();
                let latched = cause & (CH_IRQ_ERROR | CH_IRQ_DESC_TIMEOUT);
                if latched != 0 {
                    w.set_irq_cause(latched);
                }
                cause
            })
        };
        // Direct mode completes one transfer per interrupt
        let mut irq_pending = true;
        let mut delivered = 0;

        while let Some((state, cookie, chain)) = slot.front() {
            match state {
                SwState::Prepared => {
                    if slot.paused || !cookie.is_at_or_before(slot.issued) {
                        break;
                    }
                    if let Err(_e) = arm(slot, regs, &caps, &mut self.delay) {
                        #[cfg(feature = "log")]
                        warn!("ch{}: arming transfer {} failed: {}", ch, cookie.0, _e);
                        break;
                    }
                }
                SwState::Active => {
                    let done = if legacy {
                        slot.ring.chain_done(&chain)
                    } else {
                        irq_pending
                    };
                    if !done {
                        break;
                    }
                    let error = if legacy {
                        slot.ring.chain_error(&chain)
                    } else {
                        cause & (CH_IRQ_ERROR | CH_IRQ_DESC_TIMEOUT) != 0
                    };
                    irq_pending = false;

                    let Some(desc) = slot.queue.pop() else {
                        break;
                    };
                    if legacy {
                        slot.ring.release(desc.chain.count);
                    }
                    if let Some(callback) = desc.callback {
                        callback.on_complete(Completion {
                            channel: ch,
                            cookie: desc.cookie,
                            bytes: desc.chain.bytes,
                            error,
                        });
                    }
                    delivered += 1;
                }
            }
        }

        let mask = irq_mask(&caps);
        regs.with_channel(ch, |w| w.set_irq_enable(mask));
        delivered
    }

    // =========================================================================
    // Channel Settings
    // =========================================================================

    fn apply_option(&mut self, ch: u8, option: ChannelOption) -> Result<()> {
        let i = self.check(ch)?;
        let caps = self.caps;
        self.slots[i].hw.apply(self.regs, &caps, option, Apply::Strict)
    }

    /// Set the class/priority (0..=31)
    pub fn set_class(&mut self, ch: u8, class: u8) -> Result<()> {
        self.apply_option(ch, ChannelOption::Class(class))
    }

    /// Read the class/priority back from hardware
    pub fn class(&self, ch: u8) -> Result<u8> {
        let i = self.check(ch)?;
        Ok(self.slots[i].hw.class(self.regs))
    }

    /// Set the polling tick pair; `None` disables polling
    ///
    /// A pair whose arbitrated count exceeds the non-arbitrated count is
    /// ignored without touching the hardware.
    pub fn set_poll_ticks(&mut self, ch: u8, ticks: Option<PollTicks>) -> Result<()> {
        self.apply_option(ch, ChannelOption::PollTicks(ticks))
    }

    /// Set the byte offset length (RX only); 0 disables
    pub fn set_byte_offset(&mut self, ch: u8, len: u8) -> Result<()> {
        self.apply_option(ch, ChannelOption::ByteOffset(len))
    }

    /// Set or clear data endian swapping
    pub fn set_data_swap(&mut self, ch: u8, swap: Option<SwapType>) -> Result<()> {
        self.apply_option(ch, ChannelOption::DataSwap(swap))
    }

    /// Set or clear descriptor endian swapping
    pub fn set_desc_swap(&mut self, ch: u8, swap: Option<SwapType>) -> Result<()> {
        self.apply_option(ch, ChannelOption::DescSwap(swap))
    }

    /// Set or clear header mode (RX only)
    pub fn set_header_mode(&mut self, ch: u8, header: Option<HeaderMode>) -> Result<()> {
        self.apply_option(ch, ChannelOption::Header(header))
    }

    /// Enable or disable non-posted writes (RX only)
    pub fn set_write_non_posted(&mut self, ch: u8, enabled: bool) -> Result<()> {
        self.apply_option(ch, ChannelOption::WriteNonPosted(enabled))
    }

    /// Enable or disable adaptive burst chop (TX only)
    pub fn set_adaptive_chop(&mut self, ch: u8, enabled: bool) -> Result<()> {
        self.apply_option(ch, ChannelOption::AdaptiveChop(enabled))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Every register of `ch`'s window
    pub fn dump_channel_registers(&self, ch: u8) -> Result<ChannelRegisterDump> {
        let i = self.check(ch)?;
        Ok(self.slots[i].hw.dump(self.regs))
    }

    /// Every descriptor of `ch`'s ring; empty in direct mode
    pub fn dump_descriptor_ring(
        &self,
        ch: u8,
    ) -> Result<impl Iterator<Item = DescriptorSnapshot> + '_> {
        let i = self.check(ch)?;
        let ring = &self.slots[i].ring;
        Ok(ring.iter().enumerate().map(move |(index, d)| DescriptorSnapshot {
            index,
            bus_addr: ring.bus_addr_of(index),
            buffer_addr: d.buffer_addr(),
            next_addr: d.next_addr(),
            len: d.len(),
            control: d.raw_control(),
            owned: d.is_owned(),
            first: d.is_first(),
            last: d.is_last(),
        }))
    }

    /// Global registers and every port control register
    pub fn dump_global_config(&self) -> GlobalConfigDump {
        let regs = self.regs;
        let mut dump = GlobalConfigDump {
            revision: regs.read(REVISION_OFFSET),
            config: regs.read(CONFIG_OFFSET),
            poll_count: regs.read(POLL_COUNT_OFFSET),
            irq_mask: regs.read(IRQ_MASK_OFFSET),
            irq_cause: regs.read(IRQ_CAUSE_OFFSET),
            desc_timeout: regs.read(DESC_TIMEOUT_OFFSET),
            outstanding_reads: regs.read(ORRC_OFFSET),
            ..GlobalConfigDump::default()
        };
        for (i, slot) in dump.resource_pool.iter_mut().enumerate() {
            *slot = regs.read(res_pool_offset(i));
        }
        for port in 0..self.caps.port_count {
            dump.ports[port as usize] = regs.with_port(port, |w| w.ctrl());
        }
        dump
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
