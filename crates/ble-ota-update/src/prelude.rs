//! Convenience re-exports for running updates

pub use crate::config::{MAX_TRANSFER_RETRIES, OtaConfig};
pub use crate::error::OtaError;
pub use crate::image::FirmwareImage;
pub use crate::interrupt::{Interrupt, InterruptHandle, interrupt_pair};
pub use crate::outcome::{UpdateOutcome, UpdateSummary};
pub use crate::policy::{AutoConfirm, DenyRisky, PolicyQuestion, UpdatePolicy};
pub use crate::progress::{UpdatePhase, UpdateProgress};
pub use crate::session::UpdateSession;
pub use crate::transport::{
    Connector, DeviceInfo, GattTransport, TransportError, read_device_info,
};
pub use crate::version::VersionCode;

#[cfg(feature = "btleplug")]
pub use crate::ble::{BtleplugConnector, BtleplugTransport};
