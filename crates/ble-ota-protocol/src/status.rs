//! Status characteristic decoding.
//!
//! The peripheral reports two bytes: its OTA state and the last error code.
//! Both are modelled as closed enums with an `Unknown` variant that keeps the
//! raw byte, so nothing is silently coerced.

use std::borrow::Cow;

const STATE_IDLE: u8 = 0x00;
const STATE_PREPARING: u8 = 0x01;
const STATE_RECEIVING: u8 = 0x02;
const STATE_VERIFYING: u8 = 0x03;
const STATE_COMPLETED: u8 = 0x04;
const STATE_ERROR: u8 = 0xFF;

/// OTA state reported by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    /// No update in progress.
    #[default]
    Idle,
    /// Erasing / preparing the target slot.
    Preparing,
    /// Accepting data packets.
    Receiving,
    /// Checking the received image.
    Verifying,
    /// Image verified and ready to boot.
    Completed,
    /// Update failed; see the error byte.
    Error,
    /// Byte outside the documented set.
    Unknown(u8),
}

impl DeviceState {
    /// Decode the state byte.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            STATE_IDLE => DeviceState::Idle,
            STATE_PREPARING => DeviceState::Preparing,
            STATE_RECEIVING => DeviceState::Receiving,
            STATE_VERIFYING => DeviceState::Verifying,
            STATE_COMPLETED => DeviceState::Completed,
            STATE_ERROR => DeviceState::Error,
            other => DeviceState::Unknown(other),
        }
    }

    /// Encode back to the wire byte.
    pub const fn to_byte(self) -> u8 {
        match self {
            DeviceState::Idle => STATE_IDLE,
            DeviceState::Preparing => STATE_PREPARING,
            DeviceState::Receiving => STATE_RECEIVING,
            DeviceState::Verifying => STATE_VERIFYING,
            DeviceState::Completed => STATE_COMPLETED,
            DeviceState::Error => STATE_ERROR,
            DeviceState::Unknown(raw) => raw,
        }
    }

    /// Protocol name (`"IDLE"`, ...); unknown bytes render as `0xNN`.
    pub fn name(self) -> Cow<'static, str> {
        match self {
            DeviceState::Idle => Cow::Borrowed("IDLE"),
            DeviceState::Preparing => Cow::Borrowed("PREPARING"),
            DeviceState::Receiving => Cow::Borrowed("RECEIVING"),
            DeviceState::Verifying => Cow::Borrowed("VERIFYING"),
            DeviceState::Completed => Cow::Borrowed("COMPLETED"),
            DeviceState::Error => Cow::Borrowed("ERROR"),
            DeviceState::Unknown(raw) => Cow::Owned(format!("0x{raw:02X}")),
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Error code reported alongside [`DeviceState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// No error (0x00).
    #[default]
    None,
    /// 0x01
    DeviceNotReady,
    /// 0x02
    FileSizeMismatch,
    /// 0x03
    FlashWriteFailed,
    /// 0x04
    VerificationFailed,
    /// 0x05
    NotEnoughSpace,
    /// 0x06
    TransferTimeout,
    /// Code outside the documented set.
    Unknown(u8),
}

impl ErrorCode {
    /// Decode the error byte.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => ErrorCode::None,
            0x01 => ErrorCode::DeviceNotReady,
            0x02 => ErrorCode::FileSizeMismatch,
            0x03 => ErrorCode::FlashWriteFailed,
            0x04 => ErrorCode::VerificationFailed,
            0x05 => ErrorCode::NotEnoughSpace,
            0x06 => ErrorCode::TransferTimeout,
            other => ErrorCode::Unknown(other),
        }
    }

    /// Encode back to the wire byte.
    pub const fn to_byte(self) -> u8 {
        match self {
            ErrorCode::None => 0x00,
            ErrorCode::DeviceNotReady => 0x01,
            ErrorCode::FileSizeMismatch => 0x02,
            ErrorCode::FlashWriteFailed => 0x03,
            ErrorCode::VerificationFailed => 0x04,
            ErrorCode::NotEnoughSpace => 0x05,
            ErrorCode::TransferTimeout => 0x06,
            ErrorCode::Unknown(raw) => raw,
        }
    }

    /// Human-readable message for the code.
    ///
    /// `None` and undocumented codes both fall through to the generic
    /// `"Unknown error: 0xNN"` rendering; the peripheral only sets the byte
    /// together with [`DeviceState::Error`].
    pub fn message(self) -> Cow<'static, str> {
        match self {
            ErrorCode::DeviceNotReady => Cow::Borrowed("Device not ready"),
            ErrorCode::FileSizeMismatch => Cow::Borrowed("File size mismatch"),
            ErrorCode::FlashWriteFailed => Cow::Borrowed("Write to flash failed"),
            ErrorCode::VerificationFailed => Cow::Borrowed("Verification failed"),
            ErrorCode::NotEnoughSpace => Cow::Borrowed("Not enough space"),
            ErrorCode::TransferTimeout => Cow::Borrowed("Transfer timeout"),
            ErrorCode::None | ErrorCode::Unknown(_) => {
                Cow::Owned(format!("Unknown error: 0x{:02X}", self.to_byte()))
            }
        }
    }

    /// Whether this is one of the six documented codes.
    pub const fn is_known(self) -> bool {
        !matches!(self, ErrorCode::None | ErrorCode::Unknown(_))
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Decoded Status characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatus {
    /// Reported OTA state
    pub state: DeviceState,
    /// Reported error code
    pub error: ErrorCode,
}

impl DeviceStatus {
    /// Build a status from its parts.
    pub const fn new(state: DeviceState, error: ErrorCode) -> Self {
        Self { state, error }
    }

    /// Decode a Status read. A missing state byte reads as `IDLE` and a
    /// missing error byte as `0`; trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut it = bytes.iter().copied();
        let state = it.next().map_or(DeviceState::Idle, DeviceState::from_byte);
        let error = it.next().map_or(ErrorCode::None, ErrorCode::from_byte);
        Self { state, error }
    }

    /// Encode as the two-byte Status payload.
    pub const fn encode(self) -> [u8; 2] {
        [self.state.to_byte(), self.error.to_byte()]
    }

    /// Whether the peripheral reports a failure.
    pub const fn is_error(self) -> bool {
        matches!(self.state, DeviceState::Error)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_error() {
            write!(f, "{} ({})", self.state, self.error)
        } else {
            write!(f, "{}", self.state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_status() {
        let status = DeviceStatus::decode(&[0xFF, 0x03]);
        assert_eq!(status.state, DeviceState::Error);
        assert_eq!(status.error, ErrorCode::FlashWriteFailed);
        assert_eq!(status.error.message(), "Write to flash failed");
        assert!(status.is_error());
    }

    #[test]
    fn decode_short_payloads_default() {
        assert_eq!(DeviceStatus::decode(&[]), DeviceStatus::default());
        assert_eq!(
            DeviceStatus::decode(&[0x04]),
            DeviceStatus::new(DeviceState::Completed, ErrorCode::None)
        );
    }

    #[test]
    fn unknown_bytes_are_preserved() {
        let status = DeviceStatus::decode(&[0x7E, 0x42, 0x00]);
        assert_eq!(status.state, DeviceState::Unknown(0x7E));
        assert_eq!(status.error, ErrorCode::Unknown(0x42));
        assert_eq!(status.state.to_string(), "0x7E");
        assert_eq!(status.error.message(), "Unknown error: 0x42");
        assert_eq!(status.encode(), [0x7E, 0x42]);
    }

    #[test]
    fn all_documented_messages() {
        let messages: Vec<_> = (0x01..=0x06)
            .map(|b| ErrorCode::from_byte(b).message().into_owned())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Device not ready",
                "File size mismatch",
                "Write to flash failed",
                "Verification failed",
                "Not enough space",
                "Transfer timeout",
            ]
        );
        assert!((0x01..=0x06).all(|b| ErrorCode::from_byte(b).is_known()));
        assert!(!ErrorCode::None.is_known());
    }

    #[test]
    fn state_names() {
        assert_eq!(DeviceState::Completed.to_string(), "COMPLETED");
        assert_eq!(DeviceState::from_byte(0xFF), DeviceState::Error);
        assert_eq!(
            DeviceStatus::new(DeviceState::Error, ErrorCode::NotEnoughSpace).to_string(),
            "ERROR (Not enough space)"
        );
    }
}
