//! Descriptor Memory Management
//!
//! - [`DescriptorRing`]: per-channel ring of hardware descriptors (legacy mode)
//! - [`TransferQueue`]: bounded FIFO of software transfer descriptors
//! - [`HwDescriptor`]: the 16-byte descriptor shared with the controller

pub mod descriptor;
mod queue;
mod ring;

pub use descriptor::HwDescriptor;
pub use queue::{SwDescriptor, SwState, TransferQueue};
pub use ring::{Chain, DescriptorRing};
