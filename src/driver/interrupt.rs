//! Interrupt top half.
//!
//! [`InterruptDispatcher`] runs in interrupt context. It reads the shared
//! cause register, masks and acknowledges every channel found there, and
//! schedules that channel on the [`CompletionQueue`]. Client callbacks run
//! later, from [`Controller::process_completions`](crate::Controller::process_completions).

#[cfg(feature = "log")]
use log::warn;

use crate::internal::constants::MAX_CHANNELS;
use crate::internal::register::global::IRQ_CAUSE_OFFSET;
use crate::internal::register::{DmaRegisters, RegisterBus};
use crate::sync::CompletionQueue;

// =============================================================================
// Handler Result
// =============================================================================

/// Outcome of one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// At least one channel was scheduled; carries the channel bitmask
    Handled(u32),
    /// The cause register was empty
    Spurious,
}

impl IrqReturn {
    /// True if any channel was scheduled
    #[inline]
    pub fn is_handled(&self) -> bool {
        matches!(self, IrqReturn::Handled(_))
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Device-level interrupt handler
///
/// Needs only shared references, so it can live next to a `static`
/// register block and completion queue and be called from the ISR while the
/// [`Controller`](crate::Controller) is used from thread context.
///
/// # Example
///
/// ```ignore
/// static REGS: DmaRegisters<MmioBus> = DmaRegisters::new(unsafe { MmioBus::new(DMA_BASE) });
/// static COMPLETIONS: CompletionQueue = CompletionQueue::new();
///
/// #[interrupt]
/// fn DMA() {
///     InterruptDispatcher::new(&REGS, &COMPLETIONS).handle();
/// }
/// ```
pub struct InterruptDispatcher<'a, B: RegisterBus> {
    regs: &'a DmaRegisters<B>,
    completions: &'a CompletionQueue,
}

impl<'a, B: RegisterBus> InterruptDispatcher<'a, B> {
    /// Create a dispatcher over a register block and its completion queue
    pub const fn new(regs: &'a DmaRegisters<B>, completions: &'a CompletionQueue) -> Self {
        Self { regs, completions }
    }

    /// Handle one device interrupt
    ///
    /// Never blocks. For each channel bit in the cause register the channel's
    /// interrupt enable is cleared and the bit acknowledged before the
    /// channel is scheduled; `process_completions` re-enables it.
    pub fn handle(&self) -> IrqReturn {
        let cause = self.regs.read(IRQ_CAUSE_OFFSET);
        if cause == 0 {
            self.completions.record_spurious();
            #[cfg(feature = "log")]
            warn!("spurious DMA interrupt");
            return IrqReturn::Spurious;
        }

        for ch in 0..MAX_CHANNELS as u8 {
            if cause & (1u32 << ch) == 0 {
                continue;
            }
            self.regs.with_channel(ch, |w| w.set_irq_enable(0));
            self.regs.write(IRQ_CAUSE_OFFSET, 1u32 << ch);
            self.completions.schedule(ch);
        }
        IrqReturn::Handled(cause)
    }

    /// Interrupts so far that found no cause bit set
    pub fn spurious_count(&self) -> u32 {
        self.completions.spurious_count()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
