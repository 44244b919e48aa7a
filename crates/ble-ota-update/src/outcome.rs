//! Update results and history records.

use std::time::Duration;

use ble_ota_protocol::DeviceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OtaError;
use crate::transport::GattTransport;
use crate::version::VersionCode;

/// Result of one [`UpdateSession::run`](crate::UpdateSession::run).
///
/// `success` is true once `REBOOT` was issued after a verified image.
/// `new_version` is only filled when the device could be reached again
/// afterwards; its absence does not make the update a failure.
pub struct UpdateOutcome {
    /// Whether the image was flashed and the device told to reboot
    pub success: bool,

    /// Version reported by the device after reboot
    pub new_version: Option<VersionCode>,

    /// Error that ended a failed update
    pub error: Option<OtaError>,

    /// Target device
    pub device_id: String,

    /// Version the caller reported before the update
    pub previous_version: Option<VersionCode>,

    /// Image size in bytes
    pub image_size: u64,

    /// Image MD5, lowercase hex
    pub checksum: String,

    /// Image file name, if known
    pub image_name: Option<String>,

    /// Whole-image transfer attempts made
    pub transfer_attempts: u32,

    /// Connections opened after reboot
    pub reconnect_attempts: u32,

    /// Last status read from the device
    pub last_status: Option<DeviceStatus>,

    /// Wall-clock time of the whole update
    pub duration: Duration,

    /// The caller's connection, still open, when the update failed.
    /// `None` after `REBOOT`, when the link has been released.
    pub transport: Option<Box<dyn GattTransport>>,
}

impl std::fmt::Debug for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateOutcome")
            .field("success", &self.success)
            .field("new_version", &self.new_version)
            .field("error", &self.error)
            .field("device_id", &self.device_id)
            .field("previous_version", &self.previous_version)
            .field("image_size", &self.image_size)
            .field("checksum", &self.checksum)
            .field("image_name", &self.image_name)
            .field("transfer_attempts", &self.transfer_attempts)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("last_status", &self.last_status)
            .field("duration", &self.duration)
            .field(
                "transport",
                &self.transport.as_ref().map(|t| t.device_id().to_string()),
            )
            .finish()
    }
}

impl UpdateOutcome {
    /// Persistence-ready record of this outcome, stamped now.
    pub fn summary(&self) -> UpdateSummary {
        self.summary_at(Utc::now())
    }

    /// Persistence-ready record of this outcome with an explicit timestamp.
    pub fn summary_at(&self, timestamp: DateTime<Utc>) -> UpdateSummary {
        UpdateSummary {
            timestamp,
            device: DeviceRecord {
                id: self.device_id.clone(),
            },
            firmware: FirmwareRecord {
                file: self.image_name.clone(),
                size: self.image_size,
                md5: self.checksum.clone(),
            },
            version: VersionRecord {
                old: self.previous_version.as_ref().map(ToString::to_string),
                new: self.new_version.as_ref().map(ToString::to_string),
            },
            result: ResultRecord {
                success: self.success,
                duration_seconds: self.duration.as_secs_f64(),
                error: self.error.as_ref().map(ToString::to_string),
            },
        }
    }
}

/// History entry for one update. Built by the engine; storing it is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// When the record was built
    pub timestamp: DateTime<Utc>,
    /// Target device
    pub device: DeviceRecord,
    /// Image flashed
    pub firmware: FirmwareRecord,
    /// Versions before and after
    pub version: VersionRecord,
    /// How it ended
    pub result: ResultRecord,
}

impl UpdateSummary {
    /// Single-line JSON, suitable for appending to a history log.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Device section of an [`UpdateSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier or address
    pub id: String,
}

/// Firmware section of an [`UpdateSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareRecord {
    /// File name
    pub file: Option<String>,
    /// Size in bytes
    pub size: u64,
    /// MD5, lowercase hex
    pub md5: String,
}

/// Version section of an [`UpdateSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version before the update
    pub old: Option<String>,
    /// Version read back after reboot
    pub new: Option<String>,
}

/// Result section of an [`UpdateSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Whether the update succeeded
    pub success: bool,
    /// Total duration
    pub duration_seconds: f64,
    /// Error text of a failed update
    pub error: Option<String>,
}
