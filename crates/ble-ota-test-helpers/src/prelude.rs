//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use ble_ota_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};
pub use crate::{assert_contiguous_seq, assert_update_failed, assert_update_succeeded};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{fast_config, firmware_bytes, firmware_image, firmware_with_version};

#[cfg(feature = "mock")]
pub use crate::mock::MockOtaDevice;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
