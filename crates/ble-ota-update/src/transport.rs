//! GATT transport abstraction.
//!
//! The engine never talks to a BLE stack directly. A [`GattTransport`] is one
//! live connection to the OTA service; a [`Connector`] opens fresh ones, which
//! the session needs after the device reboots and drops the link.

use async_trait::async_trait;
use ble_ota_protocol::{Channel, Command, DeviceStatus, decode_version};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::OtaError;

/// Link-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Link dropped or was never up
    #[error("device disconnected")]
    Disconnected,

    /// OTA characteristic missing from the discovered services
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    /// Connection attempt failed
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Operation did not complete in time
    #[error("operation timed out")]
    Timeout,

    /// Error surfaced by the underlying BLE stack
    #[error("backend error: {0}")]
    Backend(String),
}

impl TransportError {
    /// Whether a fresh attempt over a new or recovered link could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::CharacteristicNotFound(_))
    }
}

/// One connection to a device exposing the OTA service.
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Stable identifier of the connected peripheral.
    fn device_id(&self) -> &str;

    /// Whether the link is currently up.
    async fn is_connected(&self) -> bool;

    /// Write `payload` to `channel`. Control writes wait for the response;
    /// Data writes do not.
    async fn write(&mut self, channel: Channel, payload: &[u8]) -> Result<(), TransportError>;

    /// Read the current value of `channel`.
    async fn read(&mut self, channel: Channel) -> Result<Vec<u8>, TransportError>;

    /// Best-effort disconnect.
    async fn disconnect(&mut self);
}

/// Opens new connections to one device.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and resolve the OTA characteristics.
    async fn connect(&self) -> Result<Box<dyn GattTransport>, TransportError>;
}

/// Version and status of a connected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Reported firmware version, `None` when the characteristic is empty
    pub version: Option<String>,
    /// Current OTA status
    pub status: DeviceStatus,
}

/// Encode and write a Control command.
pub async fn send_command(
    transport: &mut dyn GattTransport,
    command: Command,
) -> Result<(), TransportError> {
    debug!(device = transport.device_id(), %command, "Sending control command");
    transport
        .write(Channel::Control, &command.to_bytes())
        .await
}

/// Read and decode the Status characteristic.
pub async fn read_status(transport: &mut dyn GattTransport) -> Result<DeviceStatus, OtaError> {
    let bytes = transport.read(Channel::Status).await?;
    let status = DeviceStatus::decode(&bytes);
    debug!(
        device = transport.device_id(),
        state = %status.state,
        error = status.error.to_byte(),
        "Read status"
    );
    Ok(status)
}

/// Read the Version characteristic; `None` when the device reports nothing.
pub async fn read_version(transport: &mut dyn GattTransport) -> Result<Option<String>, OtaError> {
    let bytes = transport.read(Channel::Version).await?;
    let version = decode_version(&bytes)?;
    Ok((!version.is_empty()).then_some(version))
}

/// Read version and status from a connected device.
pub async fn read_device_info(transport: &mut dyn GattTransport) -> Result<DeviceInfo, OtaError> {
    if !transport.is_connected().await {
        return Err(OtaError::NotConnected);
    }
    let version = read_version(transport).await?;
    let status = read_status(transport).await?;
    Ok(DeviceInfo { version, status })
}

/// Log the failure of a best-effort operation and carry on.
///
/// Returns whether the operation succeeded.
pub(crate) fn discard<T, E: std::fmt::Display>(operation: &str, result: Result<T, E>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!(operation, error = %e, "Ignoring failed best-effort operation");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_reports_outcome() {
        assert!(discard::<(), TransportError>("noop", Ok(())));
        assert!(!discard::<(), _>("abort", Err(TransportError::Timeout)));
    }

    #[test]
    fn missing_characteristic_is_not_retryable() {
        assert!(!TransportError::CharacteristicNotFound(Uuid::nil()).is_retryable());
        assert!(TransportError::Disconnected.is_retryable());
        assert!(TransportError::Timeout.is_retryable());
    }
}
