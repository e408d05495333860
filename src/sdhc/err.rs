//! # SDHC Error Types
//!
//! This module defines error types for SDHC controller operations.

/// SDHC controller error enumeration.
///
/// Every fallible driver operation reports one of these; the taxonomy is
/// surfaced verbatim to the caller and carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdhcError {
    /// Card absent at start, or a removal interrupt arrived mid-operation
    NoCard,
    /// Controller reported a command-line timeout
    CmdTimeout,
    /// CRC/index/end-bit error on the command line, or unclassified
    CmdError,
    /// Timeout on the data lines
    DataTimeout,
    /// CRC or end-bit failure on the data lines
    DataError,
    /// Size or alignment the engine cannot handle
    NotSupported,
    /// Interrupt status did not match the expected completion pattern
    WrongInterrupt,
}

/// Result type for SDHC operations.
pub type SdhcResult<T = ()> = Result<T, SdhcError>;
