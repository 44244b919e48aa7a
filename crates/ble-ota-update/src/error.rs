//! Error types for OTA update operations

use std::path::PathBuf;

use ble_ota_protocol::{DeviceState, ErrorCode, ProtocolError};
use thiserror::Error;

use crate::interrupt::Interrupted;
use crate::policy::PolicyQuestion;
use crate::transport::TransportError;

/// Errors that can terminate an OTA update
#[derive(Error, Debug)]
pub enum OtaError {
    /// Firmware image has no bytes
    #[error("firmware image is empty")]
    EmptyImage,

    /// Firmware file does not exist
    #[error("firmware file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error while loading an image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image does not fit the 32-bit size field of `START`
    #[error("firmware image of {0} bytes is too large for the OTA protocol")]
    ImageTooLarge(u64),

    /// Transport was not connected when the update began
    #[error("device not connected")]
    NotConnected,

    /// Device reported an error through the Status channel
    #[error("device error: {0}")]
    Device(ErrorCode),

    /// Whole-image transfer failed on every attempt
    #[error("transfer failed after {attempts} attempts: {last_error}")]
    TransferFailed {
        /// Attempts made
        attempts: u32,
        /// Fault that ended the final attempt
        last_error: TransportError,
    },

    /// Device reported a state that does not fit the current phase
    #[error("unexpected state: {0}")]
    UnexpectedState(DeviceState),

    /// Update policy declined to continue
    #[error("update cancelled: {0}")]
    Cancelled(PolicyQuestion),

    /// Caller interrupted the update
    #[error("update interrupted")]
    Interrupted,

    /// Transport fault outside the transfer phase
    #[error("OTA error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed payload from or for the device
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OtaError {
    /// Whether the session should try to `ABORT` the device before giving up.
    ///
    /// Device-reported failures leave the device in a state it already knows
    /// about; link faults, exhausted transfers and interrupts do not.
    pub fn requires_abort(&self) -> bool {
        matches!(
            self,
            OtaError::Transport(_)
                | OtaError::Protocol(_)
                | OtaError::TransferFailed { .. }
                | OtaError::Interrupted
        )
    }

    /// Whether the failure was reported by the device itself.
    pub fn is_device_reported(&self) -> bool {
        matches!(self, OtaError::Device(_) | OtaError::UnexpectedState(_))
    }

    /// Whether the update never touched the device.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            OtaError::EmptyImage
                | OtaError::FileNotFound(_)
                | OtaError::Io(_)
                | OtaError::ImageTooLarge(_)
                | OtaError::Cancelled(_)
                | OtaError::InvalidConfig(_)
        )
    }
}

impl From<Interrupted> for OtaError {
    fn from(_: Interrupted) -> Self {
        OtaError::Interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_renders_message() {
        let err = OtaError::Device(ErrorCode::FlashWriteFailed);
        assert_eq!(err.to_string(), "device error: Write to flash failed");
        assert!(err.is_device_reported());
        assert!(!err.requires_abort());
    }

    #[test]
    fn faults_require_abort() {
        assert!(OtaError::Transport(TransportError::Disconnected).requires_abort());
        assert!(OtaError::Interrupted.requires_abort());
        assert!(
            OtaError::TransferFailed {
                attempts: 3,
                last_error: TransportError::Disconnected
            }
            .requires_abort()
        );
        assert!(!OtaError::NotConnected.requires_abort());
    }

    #[test]
    fn unexpected_state_carries_raw_name() {
        let err = OtaError::UnexpectedState(DeviceState::Unknown(0x33));
        assert_eq!(err.to_string(), "unexpected state: 0x33");
        let err = OtaError::UnexpectedState(DeviceState::Receiving);
        assert_eq!(err.to_string(), "unexpected state: RECEIVING");
    }

    #[test]
    fn cancellation_is_pre_flight() {
        assert!(OtaError::Cancelled(PolicyQuestion::Downgrade).is_pre_flight());
        assert!(!OtaError::NotConnected.is_pre_flight());
    }
}
