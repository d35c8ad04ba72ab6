//! Core driver components for the DMA controller.
//!
//! - [`capability`] - Revision/kind capability model
//! - [`config`] - Controller, port and channel configuration with builders
//! - [`error`] - Error types and result aliases
//! - [`channel`] - Per-channel state machine and tuning options
//! - [`port`] - Port burst length and endian configuration
//! - [`transfer`] - Scatter-gather fragments, cookies and completion callbacks
//! - [`interrupt`] - Interrupt top half
//! - [`controller`] - The controller itself
//!
//! # Example
//!
//! ```ignore
//! use mgdma::driver::{ChannelConfig, ControllerConfig, InstanceKind, Revision};
//!
//! let config = ControllerConfig::new(InstanceKind::Rx, Revision::Gen3)
//!     .with_channel(0, ChannelConfig::new().with_byte_offset(2));
//! ```

// Submodules
pub mod capability;
pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod interrupt;
pub mod port;
pub mod transfer;

// Re-exports for convenience
pub use capability::{BurstEncoding, BurstLen, Capabilities, DescriptorMode, InstanceKind, Revision};
pub use channel::{Channel, ChannelOption, ChannelRegisterDump, ChannelState, Direction};
pub use config::{
    ChannelConfig, ChannelControl, ControllerConfig, DescriptorBase, GlobalFeatures, HeaderMode,
    PollTicks, PortConfig, SwapType,
};
pub use controller::{
    BringUpReport, Controller, DescriptorRegion, DescriptorSnapshot, GlobalConfigDump,
};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use interrupt::{InterruptDispatcher, IrqReturn};
pub use port::Port;
pub use transfer::{Completion, Cookie, Fragment, TransferCallback, TransferStatus};
