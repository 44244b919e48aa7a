//! Control-channel commands.

use crate::error::ProtocolError;

/// Control opcodes as they appear in byte 0 of a Control write.
pub mod opcodes {
    /// Begin a transfer; followed by the LE `u32` image size.
    pub const START: u8 = 0x01;
    /// Transfer finished; device verifies what it received.
    pub const END: u8 = 0x02;
    /// Drop any partially received image.
    pub const ABORT: u8 = 0x03;
    /// Boot into the newly written image.
    pub const REBOOT: u8 = 0x04;
}

/// Longest encoded command (`START` + size).
pub const MAX_COMMAND_LEN: usize = 5;

/// Command written to the Control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Prepare to receive `size` bytes.
    Start {
        /// Total image size in bytes
        size: u32,
    },
    /// All data sent; verify.
    End,
    /// Reset receive state.
    Abort,
    /// Reboot into the new image.
    Reboot,
}

impl Command {
    /// Build a `START` for an image of `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::SizeOverflow`] when `len` does not fit the
    /// 32-bit size field.
    pub fn start(len: u64) -> Result<Self, ProtocolError> {
        let Ok(size) = u32::try_from(len) else {
            return Err(ProtocolError::SizeOverflow(len));
        };
        Ok(Command::Start { size })
    }

    /// Opcode byte.
    pub const fn opcode(self) -> u8 {
        match self {
            Command::Start { .. } => opcodes::START,
            Command::End => opcodes::END,
            Command::Abort => opcodes::ABORT,
            Command::Reboot => opcodes::REBOOT,
        }
    }

    /// Upper-case protocol name, used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Command::Start { .. } => "START",
            Command::End => "END",
            Command::Abort => "ABORT",
            Command::Reboot => "REBOOT",
        }
    }

    /// Encode into the Control payload.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAX_COMMAND_LEN);
        out.push(self.opcode());
        if let Command::Start { size } = self {
            out.extend_from_slice(&size.to_le_bytes());
        }
        out
    }

    /// Decode a Control payload. Used by peripheral simulators and captures.
    ///
    /// # Errors
    ///
    /// Fails on an empty payload, an unknown opcode, or a length that does not
    /// match the opcode.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        match bytes {
            [] => Err(ProtocolError::EmptyCommand),
            [opcodes::START, a, b, c, d] => Ok(Command::Start {
                size: u32::from_le_bytes([*a, *b, *c, *d]),
            }),
            [opcodes::START, ..] => Err(ProtocolError::InvalidCommandLength {
                opcode: opcodes::START,
                expected: MAX_COMMAND_LEN,
                actual: bytes.len(),
            }),
            [opcodes::END] => Ok(Command::End),
            [opcodes::ABORT] => Ok(Command::Abort),
            [opcodes::REBOOT] => Ok(Command::Reboot),
            [op @ (opcodes::END | opcodes::ABORT | opcodes::REBOOT), ..] => {
                Err(ProtocolError::InvalidCommandLength {
                    opcode: *op,
                    expected: 1,
                    actual: bytes.len(),
                })
            }
            [op, ..] => Err(ProtocolError::UnknownOpcode(*op)),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start { size } => write!(f, "START({size})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_carries_little_endian_size() {
        let bytes = Command::Start { size: 0x0001_E240 }.to_bytes();
        assert_eq!(bytes, vec![0x01, 0x40, 0xE2, 0x01, 0x00]);
    }

    #[test]
    fn single_byte_commands() {
        assert_eq!(Command::End.to_bytes(), vec![0x02]);
        assert_eq!(Command::Abort.to_bytes(), vec![0x03]);
        assert_eq!(Command::Reboot.to_bytes(), vec![0x04]);
    }

    #[test]
    fn start_rejects_oversized_images() {
        assert_eq!(
            Command::start(u64::from(u32::MAX) + 1),
            Err(ProtocolError::SizeOverflow(u64::from(u32::MAX) + 1))
        );
        assert_eq!(Command::start(1234), Ok(Command::Start { size: 1234 }));
    }

    #[test]
    fn decode_rejects_malformed_payloads() {
        assert_eq!(Command::decode(&[]), Err(ProtocolError::EmptyCommand));
        assert_eq!(
            Command::decode(&[0x09]),
            Err(ProtocolError::UnknownOpcode(0x09))
        );
        assert_eq!(
            Command::decode(&[0x01, 0x00]),
            Err(ProtocolError::InvalidCommandLength {
                opcode: 0x01,
                expected: 5,
                actual: 2
            })
        );
        assert_eq!(
            Command::decode(&[0x02, 0x00]),
            Err(ProtocolError::InvalidCommandLength {
                opcode: 0x02,
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(Command::Start { size: 7 }.to_string(), "START(7)");
        assert_eq!(Command::Reboot.to_string(), "REBOOT");
    }
}
