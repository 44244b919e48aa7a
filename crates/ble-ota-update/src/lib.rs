//! Over-the-air firmware updates for GATT peripherals.
//!
//! The engine drives a small five-characteristic OTA service (see
//! [`ble_ota_protocol`]) through a whole update:
//!
//! - pre-flight policy check for same-version reflashes and downgrades
//! - `START`, chunked Data streaming with whole-image retry, `END`
//! - device-side verification through the Status characteristic
//! - `REBOOT`, then reconnecting to read back the new version
//!
//! # Architecture
//!
//! - [`session`]: [`UpdateSession`], the update state machine
//! - [`transfer`]: [`ChunkedTransferEngine`], packet streaming and retry
//! - [`transport`]: the [`GattTransport`] and [`Connector`] seams
//! - [`image`]: [`FirmwareImage`], checksum and embedded version
//! - [`version`]: [`VersionCode`] parsing and ordering
//! - [`policy`]: the pre-flight [`UpdatePolicy`] gate
//! - [`config`]: [`OtaConfig`], timing and retry knobs
//! - [`interrupt`] and [`progress`]: cancellation and live status
//! - [`outcome`]: [`UpdateOutcome`] and the serialisable [`UpdateSummary`]
//!
//! With the `btleplug` feature, `ble` provides a transport for real
//! adapters.
//!
//! # Example
//!
//! ```ignore
//! use ble_ota_update::prelude::*;
//!
//! # async fn example(
//! #     transport: Box<dyn GattTransport>,
//! #     connector: Box<dyn Connector>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let image = FirmwareImage::from_file("firmware.bin").await?;
//! let (handle, interrupt) = interrupt_pair();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     handle.interrupt();
//! });
//!
//! let outcome = UpdateSession::new(transport, connector)
//!     .with_interrupt(interrupt)
//!     .run(&image, Some(&VersionCode::parse("1.0.0.1-S3")), &AutoConfirm)
//!     .await;
//!
//! if outcome.success {
//!     println!("Updated to {:?}", outcome.new_version);
//! } else {
//!     println!("Update failed: {:?}", outcome.error);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod image;
pub mod interrupt;
pub mod outcome;
pub mod policy;
pub mod progress;
pub mod session;
pub mod transfer;
pub mod transport;
pub mod version;

#[cfg(feature = "btleplug")]
#[cfg_attr(docsrs, doc(cfg(feature = "btleplug")))]
pub mod ble;

pub mod prelude;

pub use config::{MAX_TRANSFER_RETRIES, OtaConfig};
pub use error::OtaError;
pub use image::FirmwareImage;
pub use interrupt::{Interrupt, InterruptHandle, Interrupted, interrupt_pair};
pub use outcome::{UpdateOutcome, UpdateSummary};
pub use policy::{AutoConfirm, DenyRisky, PolicyQuestion, UpdatePolicy, evaluate_gate};
pub use progress::{ProgressReporter, UpdatePhase, UpdateProgress};
pub use session::UpdateSession;
pub use transfer::{ChunkedTransferEngine, TransferReport};
pub use transport::{
    Connector, DeviceInfo, GattTransport, TransportError, read_device_info, read_status,
    read_version, send_command,
};
pub use version::VersionCode;
