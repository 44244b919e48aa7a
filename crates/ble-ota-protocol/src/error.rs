//! Error types for wire-format decoding and framing

use thiserror::Error;

/// Errors raised while encoding or decoding OTA wire payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Control payload carried no opcode byte
    #[error("empty control payload")]
    EmptyCommand,

    /// Control opcode is not part of the protocol
    #[error("unknown control opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Control payload length does not match its opcode
    #[error("control opcode 0x{opcode:02X} expects {expected} bytes, got {actual}")]
    InvalidCommandLength {
        /// Opcode byte
        opcode: u8,
        /// Length required by the opcode
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Data packet is shorter than its sequence header
    #[error("data packet too short: {0} bytes")]
    PacketTooShort(usize),

    /// Data payload exceeds what the peer accepts in one write
    #[error("data payload of {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge {
        /// Payload length
        len: usize,
        /// Maximum accepted payload length
        max: usize,
    },

    /// Chunk size is zero or larger than the maximum payload
    #[error("invalid chunk size {0}")]
    InvalidChunkSize(usize),

    /// Firmware size does not fit the 32-bit `START` field
    #[error("firmware size {0} does not fit in 32 bits")]
    SizeOverflow(u64),

    /// Version characteristic did not hold UTF-8
    #[error("version string is not valid UTF-8: {0}")]
    InvalidVersionEncoding(#[from] std::str::Utf8Error),
}
