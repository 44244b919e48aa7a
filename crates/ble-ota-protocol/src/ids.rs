//! GATT service and characteristic identifiers.

use uuid::Uuid;

/// OTA primary service.
pub const OTA_SERVICE_UUID: Uuid = Uuid::from_u128(0xfb1e4001_54ae_4a28_9f74_dfccb248601d);
/// Control characteristic (write with response).
pub const OTA_CONTROL_CHAR_UUID: Uuid = Uuid::from_u128(0xfb1e4002_54ae_4a28_9f74_dfccb248601d);
/// Data characteristic (write without response).
pub const OTA_DATA_CHAR_UUID: Uuid = Uuid::from_u128(0xfb1e4003_54ae_4a28_9f74_dfccb248601d);
/// Status characteristic (read).
pub const OTA_STATUS_CHAR_UUID: Uuid = Uuid::from_u128(0xfb1e4004_54ae_4a28_9f74_dfccb248601d);
/// Version characteristic (read).
pub const OTA_VERSION_CHAR_UUID: Uuid = Uuid::from_u128(0xfb1e4005_54ae_4a28_9f74_dfccb248601d);

/// Logical OTA endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Command channel, acknowledged writes.
    Control,
    /// Bulk firmware stream, unacknowledged writes.
    Data,
    /// Two-byte state/error snapshot.
    Status,
    /// Running firmware version string.
    Version,
}

impl Channel {
    /// Every channel, in characteristic order.
    pub const ALL: [Channel; 4] = [
        Channel::Control,
        Channel::Data,
        Channel::Status,
        Channel::Version,
    ];

    /// Characteristic UUID backing this channel.
    pub const fn uuid(self) -> Uuid {
        match self {
            Channel::Control => OTA_CONTROL_CHAR_UUID,
            Channel::Data => OTA_DATA_CHAR_UUID,
            Channel::Status => OTA_STATUS_CHAR_UUID,
            Channel::Version => OTA_VERSION_CHAR_UUID,
        }
    }

    /// Reverse lookup from a characteristic UUID.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    /// Whether the peer accepts writes on this channel.
    pub const fn is_writable(self) -> bool {
        matches!(self, Channel::Control | Channel::Data)
    }

    /// Whether the peer serves reads on this channel.
    pub const fn is_readable(self) -> bool {
        matches!(self, Channel::Status | Channel::Version)
    }

    /// Whether writes on this channel expect a link-layer response.
    pub const fn write_with_response(self) -> bool {
        matches!(self, Channel::Control)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::Control => "control",
            Channel::Data => "data",
            Channel::Status => "status",
            Channel::Version => "version",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_vendor_contract() {
        assert_eq!(
            OTA_SERVICE_UUID.to_string(),
            "fb1e4001-54ae-4a28-9f74-dfccb248601d"
        );
        assert_eq!(
            OTA_VERSION_CHAR_UUID.to_string(),
            "fb1e4005-54ae-4a28-9f74-dfccb248601d"
        );
    }

    #[test]
    fn channel_uuid_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_uuid(channel.uuid()), Some(channel));
        }
        assert_eq!(Channel::from_uuid(OTA_SERVICE_UUID), None);
    }

    #[test]
    fn only_control_writes_with_response() {
        assert!(Channel::Control.write_with_response());
        assert!(!Channel::Data.write_with_response());
        assert!(Channel::Data.is_writable());
        assert!(!Channel::Status.is_writable());
        assert!(Channel::Version.is_readable());
    }
}
