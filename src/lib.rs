//! Multi-generation SoC DMA Controller Driver
//!
//! A `no_std`, `no_alloc` driver for a centralized descriptor-based DMA
//! engine found in several silicon generations. One instance serves one
//! engine kind (TX, RX or memory copy) with up to 32 channels sharing a
//! global register block, a channel-select window and a handful of ports.
//!
//! # Architecture
//!
//! 1. **Driver Layer** ([`driver`]): configuration, capability model,
//!    channel state machine, port setup, the [`Controller`] itself and the
//!    [`InterruptDispatcher`] top half
//! 2. **HAL Layer** ([`hal`]): bounded status polling and functional reset
//! 3. **Sync Layer** ([`sync`]): critical-section cell and the
//!    interrupt-to-worker [`CompletionQueue`]
//!
//! Register access is abstracted behind [`registers::RegisterBus`], so the
//! same driver runs on real MMIO ([`registers::MmioBus`]) and against a
//! register model on the host.
//!
//! ## Silicon Generations
//!
//! | Revision | Descriptors     | Burst encoding | Notable additions                          |
//! |----------|-----------------|----------------|--------------------------------------------|
//! | Gen1     | driver ring     | linear         | -                                          |
//! | Gen2     | caller supplied | one-hot        | channel tuning, 36-bit addressing          |
//! | Gen3     | caller supplied | one-hot        | descriptor timeout, packet drop, fetch ack |
//! | Gen4     | caller supplied | one-hot        | SRAM descriptors, resource pool, 128-bit   |
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types
//! - `log`: Warn on spurious interrupts, ignored settings, timeouts and
//!   per-channel bring-up failures
//!
//! # Example
//!
//! ```ignore
//! use mgdma::registers::{DmaRegisters, MmioBus};
//! use mgdma::{
//!     ChannelConfig, CompletionQueue, Controller, ControllerConfig, Direction, Fragment,
//!     InstanceKind, InterruptDispatcher, Revision,
//! };
//!
//! static REGS: DmaRegisters<MmioBus> = DmaRegisters::new(unsafe { MmioBus::new(0x4010_0000) });
//! static COMPLETIONS: CompletionQueue = CompletionQueue::new();
//!
//! // Interrupt handler
//! fn dma_irq() {
//!     InterruptDispatcher::new(&REGS, &COMPLETIONS).handle();
//! }
//!
//! let config = ControllerConfig::new(InstanceKind::Rx, Revision::Gen3)
//!     .with_descriptor_timeout(0x800)
//!     .with_channel(0, ChannelConfig::new().with_byte_offset(2));
//!
//! let mut dma = Controller::new(&REGS, &COMPLETIONS, delay, config, None)?;
//! let report = dma.init()?;
//! assert!(report.is_clean());
//!
//! let cookie = dma.submit_sg(0, &[Fragment::new(block, 32 * 16)], Direction::Rx, Some(&client))?;
//! dma.issue_pending(0)?;
//!
//! // Worker thread, after the interrupt fired
//! dma.process_completions();
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::capability::{
    BurstEncoding, BurstLen, Capabilities, DescriptorMode, InstanceKind, Revision,
};
pub use driver::channel::{ChannelRegisterDump, ChannelState, Direction};
pub use driver::config::{
    ChannelConfig, ChannelControl, ControllerConfig, DescriptorBase, GlobalFeatures, HeaderMode,
    PollTicks, PortConfig, SwapType,
};
pub use driver::controller::{
    BringUpReport, Controller, DescriptorRegion, DescriptorSnapshot, GlobalConfigDump,
};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::interrupt::{InterruptDispatcher, IrqReturn};
pub use driver::transfer::{Completion, Cookie, Fragment, TransferCallback, TransferStatus};
pub use internal::dma::HwDescriptor;
pub use sync::CompletionQueue;

/// Register bus and register block access.
///
/// [`DmaRegisters`](registers::DmaRegisters) is what the controller and the
/// interrupt dispatcher share; most users only construct it and never call
/// it directly.
///
/// # Safety
///
/// Direct register access bypasses the driver's state tracking. Writing
/// channel or global registers behind the controller's back leaves its view
/// of the hardware stale.
pub mod registers {
    pub use crate::internal::register::{
        ChannelWindow, DmaRegisters, MmioBus, PortWindow, RegisterBus, read_reg, write_reg,
    };
}
