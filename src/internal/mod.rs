//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//!
//! # Contents
//!
//! - [`register`]: Register bus abstraction and register map
//! - [`constants`]: Limits and timing values
//! - [`dma`]: Hardware descriptors, descriptor rings and the transfer queue

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod register;
