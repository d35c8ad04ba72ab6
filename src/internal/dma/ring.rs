//! Circular descriptor ring carved from platform-provided descriptor memory.

use core::sync::atomic::{Ordering, fence};

use super::descriptor::HwDescriptor;
use crate::driver::transfer::Fragment;
use crate::driver::error::{ConfigError, DmaError, Result};
use crate::internal::constants::{DESCRIPTOR_SIZE, MAX_SEGMENT_LEN};

/// Placement of one transfer's descriptors inside the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    /// Ring index of the first descriptor
    pub first: usize,
    /// Number of descriptors
    pub count: usize,
    /// Total bytes described
    pub bytes: u32,
}

/// Circular descriptor ring with wraparound indices.
///
/// Descriptors between `head` and `tail` belong to queued transfers; the
/// rest are free. Each descriptor's next pointer links to its successor,
/// with the last one linking back to the first.
pub struct DescriptorRing<'a> {
    descriptors: &'a [HwDescriptor],
    bus_addr: u64,
    head: usize,
    tail: usize,
    in_use: usize,
}

impl<'a> DescriptorRing<'a> {
    /// A ring with no descriptors (channels in direct mode)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            descriptors: &[],
            bus_addr: 0,
            head: 0,
            tail: 0,
            in_use: 0,
        }
    }

    /// Build a ring over `descriptors`, which the controller sees at
    /// `bus_addr`
    #[must_use]
    pub fn new(descriptors: &'a [HwDescriptor], bus_addr: u64) -> Self {
        let ring = Self {
            descriptors,
            bus_addr,
            head: 0,
            tail: 0,
            in_use: 0,
        };
        ring.link();
        ring
    }

    fn link(&self) {
        let n = self.descriptors.len();
        for (i, desc) in self.descriptors.iter().enumerate() {
            desc.reset();
            desc.set_next(self.bus_addr_of((i + 1) % n));
        }
    }

    /// Get the number of descriptors in the ring
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True for a ring without descriptors
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors not held by any queued transfer
    #[inline(always)]
    #[must_use]
    pub fn free(&self) -> usize {
        self.len() - self.in_use
    }

    /// Descriptors held by queued transfers
    #[inline(always)]
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Index of the oldest in-use descriptor
    #[inline(always)]
    #[must_use]
    pub fn head_index(&self) -> usize {
        self.head
    }

    /// Index of the next free descriptor
    #[inline(always)]
    #[must_use]
    pub fn tail_index(&self) -> usize {
        self.tail
    }

    /// Bus address of the first descriptor
    #[inline(always)]
    #[must_use]
    pub fn bus_addr(&self) -> u64 {
        self.bus_addr
    }

    /// Bus address of the descriptor at `index`
    #[inline(always)]
    #[must_use]
    pub fn bus_addr_of(&self, index: usize) -> u64 {
        let n = self.len().max(1);
        self.bus_addr + ((index % n) * DESCRIPTOR_SIZE) as u64
    }

    /// Get a reference to a descriptor at a specific index
    #[inline(always)]
    pub fn get(&self, index: usize) -> &HwDescriptor {
        &self.descriptors[index % self.len()]
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &HwDescriptor> {
        self.descriptors.iter()
    }

    /// Number of hardware descriptors `fragments` needs
    ///
    /// Fragments longer than one descriptor can carry are split.
    pub fn segments_for(&self, fragments: &[Fragment]) -> Result<usize> {
        if fragments.is_empty() {
            return Err(DmaError::InvalidLength.into());
        }
        let mut count = 0usize;
        for frag in fragments {
            if frag.len == 0 {
                return Err(DmaError::InvalidLength.into());
            }
            count += (frag.len as usize).div_ceil(MAX_SEGMENT_LEN);
        }
        if count > self.len() {
            return Err(ConfigError::InvalidDescriptorCount.into());
        }
        if count > self.free() {
            return Err(DmaError::NoDescriptorsAvailable.into());
        }
        Ok(count)
    }

    /// Write a descriptor chain for `fragments` at the tail and hand it to
    /// the controller.
    ///
    /// Only the first segment carries SOP and only the last carries EOP and
    /// the completion interrupt. Ownership is granted last-to-first so the
    /// controller can never walk into a half-built chain.
    pub fn write_chain(&mut self, fragments: &[Fragment]) -> Result<Chain> {
        let count = self.segments_for(fragments)?;
        let n = self.len();
        let first = self.tail;
        let last_frag = fragments.len() - 1;

        let mut idx = first;
        let mut written = 0usize;
        let mut bytes = 0u32;
        for (fi, frag) in fragments.iter().enumerate() {
            let mut offset = 0u32;
            while offset < frag.len {
                let seg = (frag.len - offset).min(MAX_SEGMENT_LEN as u32);
                let is_last = fi == last_frag && offset + seg == frag.len;
                self.descriptors[idx].prepare(
                    frag.addr + u64::from(offset),
                    seg,
                    written == 0,
                    is_last,
                );
                idx = (idx + 1) % n;
                written += 1;
                offset += seg;
            }
            bytes = bytes.saturating_add(frag.len);
        }

        fence(Ordering::Release);
        for i in (0..count).rev() {
            self.descriptors[(first + i) % n].set_owned();
        }
        fence(Ordering::SeqCst);

        self.tail = idx;
        self.in_use += count;
        Ok(Chain { first, count, bytes })
    }

    /// True once the controller has returned the chain's last descriptor
    #[must_use]
    pub fn chain_done(&self, chain: &Chain) -> bool {
        fence(Ordering::Acquire);
        !self.get(chain.first + chain.count - 1).is_owned()
    }

    /// True if any descriptor of the chain reports an error
    #[must_use]
    pub fn chain_error(&self, chain: &Chain) -> bool {
        (0..chain.count).any(|i| self.get(chain.first + i).has_error())
    }

    /// Return the oldest `count` descriptors to the free pool
    pub fn release(&mut self, count: usize) {
        let count = count.min(self.in_use);
        for _ in 0..count {
            self.descriptors[self.head].reset();
            self.head = (self.head + 1) % self.len();
        }
        self.in_use -= count;
    }

    /// Free every descriptor and rewind both indices
    pub fn reset(&mut self) {
        self.link();
        self.head = 0;
        self.tail = 0;
        self.in_use = 0;
    }
}

// =============================================================================
// Tests
// =============================================================================
