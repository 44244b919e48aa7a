//! Firmware image builders.

use ble_ota_update::{FirmwareImage, OtaConfig};
use std::time::Duration;

/// Deterministic, non-empty image body of `len` bytes.
pub fn firmware_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Image of `len` bytes with `VERSION=<version>` stamped near the start.
///
/// # Panics
///
/// Panics if `len` is too small to hold the stamp.
pub fn firmware_with_version(len: usize, version: &str) -> FirmwareImage {
    let stamp = format!("VERSION={version}\0");
    assert!(len > stamp.len() + 16, "image too small for version stamp");
    let mut data = firmware_bytes(len);
    // Keep the filler away from digits so the stamp is the only match.
    for b in &mut data {
        if b.is_ascii_alphanumeric() {
            *b = 0xA5;
        }
    }
    data.splice(16..16 + stamp.len(), stamp.into_bytes());
    match FirmwareImage::from_bytes(data) {
        Ok(image) => image.with_name("firmware.bin"),
        Err(e) => panic!("fixture image rejected: {e}"),
    }
}

/// Image of `len` bytes without any embedded version.
///
/// # Panics
///
/// Panics if `len` is zero.
pub fn firmware_image(len: usize) -> FirmwareImage {
    let mut data = firmware_bytes(len);
    for b in &mut data {
        if b.is_ascii_alphanumeric() {
            *b = 0xA5;
        }
    }
    match FirmwareImage::from_bytes(data) {
        Ok(image) => image,
        Err(e) => panic!("fixture image rejected: {e}"),
    }
}

/// Default configuration with every wait shortened, for tests that do not
/// run on a paused clock.
pub fn fast_config() -> OtaConfig {
    let short = Duration::from_millis(1);
    OtaConfig {
        pacing_delay: Duration::ZERO,
        retry_delay: short,
        abort_settle: short,
        restart_settle: short,
        start_settle: short,
        verify_settle: short,
        pre_reboot_delay: short,
        reboot_wait: short,
        reconfirm_retry_delay: short,
        abort_timeout: Duration::from_millis(100),
        ..OtaConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_image_reports_version() {
        let image = firmware_with_version(2048, "1.0.0.2-S3");
        assert_eq!(
            image.embedded_version().map(ToString::to_string),
            Some("1.0.0.2-S3".to_string())
        );
        assert_eq!(image.size(), 2048);
    }

    #[test]
    fn plain_image_has_no_version() {
        assert!(firmware_image(1234).embedded_version().is_none());
    }

    #[test]
    fn fast_config_is_valid() {
        assert!(matches!(fast_config().validate(), Ok(())));
    }
}
