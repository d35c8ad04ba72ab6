//! Hand-off between the interrupt handler and deferred completion work.

use super::primitives::CriticalSectionCell;

#[derive(Default)]
struct Pending {
    channels: u32,
    spurious: u32,
}

/// Channels whose interrupt fired and still await `process_completions`
///
/// Filled in interrupt context, drained in thread context. Shared by
/// reference between the two, typically as a `static`.
pub struct CompletionQueue {
    pending: CriticalSectionCell<Pending>,
}

impl CompletionQueue {
    /// Create an empty queue (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            pending: CriticalSectionCell::new(Pending {
                channels: 0,
                spurious: 0,
            }),
        }
    }

    /// Mark `channel` as needing completion processing
    pub fn schedule(&self, channel: u8) {
        self.pending.with(|p| p.channels |= 1u32 << channel);
    }

    /// Take every scheduled channel, leaving the queue empty
    pub fn take(&self) -> u32 {
        self.pending.with(|p| core::mem::take(&mut p.channels))
    }

    /// Scheduled channels without consuming them
    pub fn peek(&self) -> u32 {
        self.pending.with(|p| p.channels)
    }

    /// Count an interrupt that found no cause bit set
    pub fn record_spurious(&self) {
        self.pending.with(|p| p.spurious = p.spurious.wrapping_add(1));
    }

    /// Interrupts that found no cause bit set
    pub fn spurious_count(&self) -> u32 {
        self.pending.with(|p| p.spurious)
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}
