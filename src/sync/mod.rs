//! Synchronization and Concurrency Support
//!
//! - [`CriticalSectionCell`]: ISR-safe interior mutability
//! - [`CompletionQueue`]: interrupt-to-worker hand-off of completed channels
//!
//! The interrupt handler only reads and acknowledges cause bits and marks
//! channels in the [`CompletionQueue`]. Callbacks run later from
//! `Controller::process_completions` in thread context.

mod completion;
mod primitives;

pub use completion::CompletionQueue;
pub use primitives::CriticalSectionCell;
