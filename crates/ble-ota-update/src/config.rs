//! Update timing and retry configuration.

use std::time::Duration;

use ble_ota_protocol::{DEFAULT_CHUNK_SIZE, MAX_PAYLOAD_LEN};
use serde::{Deserialize, Serialize};

use crate::error::OtaError;

/// Whole-image transfer attempts before giving up.
pub const MAX_TRANSFER_RETRIES: u32 = 3;

/// Configuration for an update session.
///
/// Every field has a default tuned for the reference controller firmware, so
/// a JSON document only needs the keys it overrides. Durations are written in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtaConfig {
    /// Payload bytes per Data packet (1..=500)
    pub chunk_size: usize,

    /// Pause after every this many packets; 0 disables pacing
    pub pacing_interval: u32,

    /// Length of each pacing pause
    #[serde(with = "duration_ms")]
    pub pacing_delay: Duration,

    /// Whole-image transfer attempts
    pub max_transfer_attempts: u32,

    /// Wait after a failed attempt before resetting the device
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,

    /// Wait after the reset `ABORT`
    #[serde(with = "duration_ms")]
    pub abort_settle: Duration,

    /// Wait after the reset `START`
    #[serde(with = "duration_ms")]
    pub restart_settle: Duration,

    /// Wait after `START` before reading status
    #[serde(with = "duration_ms")]
    pub start_settle: Duration,

    /// Wait after `END` before reading status
    #[serde(with = "duration_ms")]
    pub verify_settle: Duration,

    /// Wait before sending `REBOOT`
    #[serde(with = "duration_ms")]
    pub pre_reboot_delay: Duration,

    /// Wait for the device to restart before reconnecting
    #[serde(with = "duration_ms")]
    pub reboot_wait: Duration,

    /// Reconnect attempts when reading the new version
    pub reconfirm_attempts: u32,

    /// Wait between failed reconnect attempts
    #[serde(with = "duration_ms")]
    pub reconfirm_retry_delay: Duration,

    /// Upper bound on best-effort writes (`ABORT`, `REBOOT`) and disconnect
    #[serde(with = "duration_ms")]
    pub abort_timeout: Duration,
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pacing_interval: 20,
            pacing_delay: Duration::from_millis(10),
            max_transfer_attempts: MAX_TRANSFER_RETRIES,
            retry_delay: Duration::from_secs(2),
            abort_settle: Duration::from_secs(1),
            restart_settle: Duration::from_millis(500),
            start_settle: Duration::from_millis(500),
            verify_settle: Duration::from_secs(2),
            pre_reboot_delay: Duration::from_millis(500),
            reboot_wait: Duration::from_secs(8),
            reconfirm_attempts: 3,
            reconfirm_retry_delay: Duration::from_secs(2),
            abort_timeout: Duration::from_secs(2),
        }
    }
}

impl OtaConfig {
    /// Parse a JSON document, filling missing keys with defaults, and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self, OtaError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OtaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, OtaError> {
        serde_json::to_string_pretty(self).map_err(|e| OtaError::InvalidConfig(e.to_string()))
    }

    /// Reject values the protocol or the engine cannot work with.
    pub fn validate(&self) -> Result<(), OtaError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_PAYLOAD_LEN {
            return Err(OtaError::InvalidConfig(format!(
                "chunk_size must be between 1 and {MAX_PAYLOAD_LEN}, got {}",
                self.chunk_size
            )));
        }
        if self.max_transfer_attempts == 0 {
            return Err(OtaError::InvalidConfig(
                "max_transfer_attempts must be at least 1".to_string(),
            ));
        }
        if self.abort_timeout.is_zero() {
            return Err(OtaError::InvalidConfig(
                "abort_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
