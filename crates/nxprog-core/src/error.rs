//! Error types for nxprog-core

use thiserror::Error;

/// Errors produced by the ISP session and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// No response to the `?` handshake
    #[error("sync timeout: no response to '?' (is the chip in ISP mode?)")]
    SyncTimeout,

    /// Handshake produced an unexpected line
    #[error("sync failed: expected {expected:?}, got {got:?}")]
    SyncMismatch {
        /// Line the protocol requires at this step
        expected: &'static str,
        /// Line actually received
        got: String,
    },

    /// Device ID matched no chip in the registry
    #[error("cannot autodetect chip from device id {word0} (0x{word0:x}), set the cpu manually")]
    AutoDetectFailed {
        /// First device ID word
        word0: u32,
        /// Second device ID word, when the chip sent one
        word1: Option<u32>,
    },

    /// The chip returned a nonzero status for a command
    #[error("'{cmd}' failed with status {code}")]
    Isp {
        /// Command that failed
        cmd: String,
        /// Nonzero status code from the chip
        code: u32,
    },

    /// A line that fits no expected shape at this point in the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A response did not arrive within the timeout
    #[error("timeout waiting for {0}")]
    ReadTimeout(String),

    /// Block checksum did not match on read or write
    #[error("checksum mismatch: got {got}, expected {expected}")]
    ChecksumMismatch {
        /// Checksum reported by the peer
        got: u64,
        /// Checksum computed over the raw bytes
        expected: u64,
    },

    /// Malformed uuencoded line
    #[error("uudecode error: {0}")]
    Codec(String),

    /// Chip name not present in the registry
    #[error("unsupported cpu {0:?}")]
    UnknownChip(String),

    /// Address outside the chip's flash region
    #[error("address 0x{0:x} is outside the flash region")]
    OutOfRangeAddress(u32),

    /// Image cannot be made bootable
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Caller passed an argument the protocol cannot express
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Failure in the underlying transport
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the core error
pub type Result<T> = std::result::Result<T, Error>;
