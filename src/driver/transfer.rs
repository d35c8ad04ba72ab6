//! Transfer descriptions and completion reporting.

/// One contiguous buffer of a scatter-gather transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fragment {
    /// Bus address of the buffer
    pub addr: u64,
    /// Length in bytes (must be non-zero)
    pub len: u32,
}

impl Fragment {
    /// Create a fragment
    #[must_use]
    pub const fn new(addr: u64, len: u32) -> Self {
        Self { addr, len }
    }
}

/// Per-channel transfer identifier handed out by `submit_sg`
///
/// Cookies increase monotonically per channel, skipping zero on wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cookie(pub u32);

impl Cookie {
    /// The value no transfer ever carries
    pub const NONE: Cookie = Cookie(0);

    /// Next cookie after this one
    #[must_use]
    pub const fn next(self) -> Cookie {
        let n = self.0.wrapping_add(1);
        if n == 0 { Cookie(1) } else { Cookie(n) }
    }

    /// True if `self` was issued no later than `other`
    #[must_use]
    pub const fn is_at_or_before(self, other: Cookie) -> bool {
        (other.0.wrapping_sub(self.0) as i32) >= 0
    }
}

/// Progress of a submitted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStatus {
    /// Queued or running
    InProgress,
    /// Finished (or discarded by `terminate_all`)
    Complete,
    /// Queued or running on a paused channel
    Paused,
}

/// Completion record passed to [`TransferCallback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    /// Channel the transfer ran on
    pub channel: u8,
    /// Transfer identifier
    pub cookie: Cookie,
    /// Total bytes described by the transfer
    pub bytes: u32,
    /// The controller flagged an error on at least one descriptor
    pub error: bool,
}

/// Client completion hook
///
/// Invoked from `process_completions`, never from interrupt context and
/// never with a driver lock held.
pub trait TransferCallback {
    /// Called once per completed transfer
    fn on_complete(&self, completion: Completion);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_next_skips_zero() {
        assert_eq!(Cookie(u32::MAX).next(), Cookie(1));
        assert_eq!(Cookie(1).next(), Cookie(2));
    }

    #[test]
    fn cookie_ordering_survives_wrap() {
        assert!(Cookie(u32::MAX - 1).is_at_or_before(Cookie(2)));
        assert!(!Cookie(2).is_at_or_before(Cookie(u32::MAX - 1)));
        assert!(Cookie(5).is_at_or_before(Cookie(5)));
    }
}
