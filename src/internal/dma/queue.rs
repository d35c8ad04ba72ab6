//! Bounded FIFO of software transfer descriptors.

use super::ring::Chain;
use crate::driver::transfer::{Cookie, TransferCallback};

/// Lifecycle of a queued transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwState {
    /// Descriptors written, not yet armed
    Prepared,
    /// Armed on the hardware
    Active,
}

/// Software view of one submitted transfer
pub struct SwDescriptor<'a> {
    /// Client-visible identifier
    pub cookie: Cookie,
    /// Ring placement (legacy mode) or descriptor block (direct mode)
    pub chain: Chain,
    /// Direct mode: bus address of the caller's descriptor block
    pub block_addr: u64,
    /// Completion hook
    pub callback: Option<&'a dyn TransferCallback>,
    /// Current lifecycle state
    pub state: SwState,
}

/// Fixed-capacity FIFO with O(1) push/pop at the ends
pub struct TransferQueue<T, const N: usize> {
    slots: [Option<T>; N],
    head: usize,
    len: usize,
}

impl<T, const N: usize> TransferQueue<T, N> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// Number of queued items
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is queued
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when no further item fits
    #[inline(always)]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append at the back; hands the item back if the queue is full
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let idx = (self.head + self.len) % N;
        self.slots[idx] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Remove from the front
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % N;
        self.len -= 1;
        item
    }

    /// Oldest item
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Oldest item, mutably
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_mut()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % N].as_ref())
    }

    /// Drop everything
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
    }
}

impl<T, const N: usize> Default for TransferQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved_across_wrap() {
        let mut q: TransferQueue<u32, 3> = TransferQueue::new();
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        q.push(3).unwrap();
        q.push(4).unwrap();

        assert!(q.is_full());
        assert_eq!(q.push(5), Err(5));
        let order: [u32; 3] = core::array::from_fn(|_| q.pop().unwrap_or(0));
        assert_eq!(order, [2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn front_mut_updates_in_place() {
        let mut q: TransferQueue<u32, 2> = TransferQueue::new();
        q.push(7).unwrap();
        if let Some(v) = q.front_mut() {
            *v = 9;
        }
        assert_eq!(q.front(), Some(&9));
    }

    #[test]
    fn clear_empties_queue() {
        let mut q: TransferQueue<u32, 2> = TransferQueue::new();
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.iter().count(), 0);
        q.push(3).unwrap();
        assert_eq!(q.front(), Some(&3));
    }
}
