//! Error types for the DMA controller driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Configuration and parameter validation failures
//! - [`DmaError`]: Descriptor and transfer preparation issues
//! - [`IoError`]: Runtime hardware failures (timeouts, bad state)
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and parameter validation errors
///
/// These are reported before any register is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Controller already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// Channel index outside the active channel set
    InvalidChannel,
    /// Port index outside the configured port table
    InvalidPort,
    /// Traffic class above 31, or class on a channel that cannot carry one
    InvalidClass,
    /// Arbitrated polling ticks greater than non-arbitrated ticks
    InvalidPollTicks,
    /// Byte offset out of range
    InvalidByteOffset,
    /// Header length zero or wider than 14 bits
    InvalidHeaderLength,
    /// Descriptor count zero or larger than the ring
    InvalidDescriptorCount,
    /// Misaligned or out-of-range bus address
    InvalidAddress,
    /// Feature absent on this controller instance or revision
    UnsupportedFeature,
    /// Feature exists only on the other channel direction
    UnsupportedDirection,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::InvalidChannel => "invalid channel",
            ConfigError::InvalidPort => "invalid port",
            ConfigError::InvalidClass => "invalid traffic class",
            ConfigError::InvalidPollTicks => "arbitrated ticks exceed non-arbitrated ticks",
            ConfigError::InvalidByteOffset => "invalid byte offset",
            ConfigError::InvalidHeaderLength => "invalid header length",
            ConfigError::InvalidDescriptorCount => "invalid descriptor count",
            ConfigError::InvalidAddress => "invalid bus address",
            ConfigError::UnsupportedFeature => "feature not supported by this controller",
            ConfigError::UnsupportedDirection => "feature not supported in this direction",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Descriptor and transfer errors
///
/// These errors relate to descriptor ring management and transfer setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Channel turned on before a descriptor base was programmed
    DescriptorsNotConfigured,
    /// Not enough free descriptors in the channel ring
    NoDescriptorsAvailable,
    /// Software transfer queue is full
    TooManyTransfers,
    /// Zero-length fragment or empty fragment list
    InvalidLength,
    /// Transfer shape not accepted by the channel's descriptor mode
    UnsupportedTransfer,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::DescriptorsNotConfigured => "descriptors not configured",
            DmaError::NoDescriptorsAvailable => "no descriptors available",
            DmaError::TooManyTransfers => "transfer queue full",
            DmaError::InvalidLength => "invalid transfer length",
            DmaError::UnsupportedTransfer => "unsupported transfer shape",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime hardware errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Hardware did not reach the expected state in time
    Timeout,
    /// Invalid state for operation (e.g., channel not configured)
    InvalidState,
    /// Cookie does not belong to any transfer on the channel
    UnknownTransfer,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::InvalidState => "invalid state for operation",
            IoError::UnknownTransfer => "unknown transfer cookie",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidClass)) => { /* ... */ }
///     Err(Error::Dma(DmaError::NoDescriptorsAvailable)) => { /* ... */ }
///     Err(Error::Io(IoError::Timeout)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for controller operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for descriptor operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for hardware operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
