//! One OTA update from policy check to post-reboot version read-back.
//!
//! ```text
//! gate -> START -> settle -> status -> transfer -> END -> settle -> status
//!      -> REBOOT -> release link -> reboot wait -> reconnect + read version
//! ```
//!
//! Every wait and every I/O await is raced against the session's
//! [`Interrupt`]. A fault or interrupt before `REBOOT` sends a best-effort
//! `ABORT` so the device does not stay in the receiving state.
//!
//! The link is only closed once `REBOOT` has been issued. A failed update
//! hands the still-open transport back in [`UpdateOutcome::transport`].

use std::time::Duration;

use ble_ota_protocol::{Command, DeviceState, DeviceStatus};
use tokio::sync::watch;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use crate::config::OtaConfig;
use crate::error::OtaError;
use crate::image::FirmwareImage;
use crate::interrupt::{Interrupt, Interrupted};
use crate::outcome::UpdateOutcome;
use crate::policy::{UpdatePolicy, evaluate_gate};
use crate::progress::{ProgressReporter, UpdatePhase, UpdateProgress};
use crate::transfer::ChunkedTransferEngine;
use crate::transport::{
    Connector, GattTransport, TransportError, discard, read_status, read_version, send_command,
};
use crate::version::VersionCode;

/// Drives a single update against one device.
///
/// The session holds the live connection for the duration of
/// [`run`](Self::run) and consumes itself. The device drops the link when it
/// reboots, so the version read-back goes through the [`Connector`]; on
/// failure the connection is returned untouched in the outcome.
pub struct UpdateSession {
    transport: Option<Box<dyn GattTransport>>,
    connector: Box<dyn Connector>,
    config: OtaConfig,
    interrupt: Interrupt,
    progress: ProgressReporter,
    device_id: String,
    transfer_attempts: u32,
    reconnect_attempts: u32,
    last_status: Option<DeviceStatus>,
}

impl UpdateSession {
    /// Session over an established connection, with default configuration.
    pub fn new(transport: Box<dyn GattTransport>, connector: Box<dyn Connector>) -> Self {
        let device_id = transport.device_id().to_string();
        Self {
            transport: Some(transport),
            connector,
            config: OtaConfig::default(),
            interrupt: Interrupt::never(),
            progress: ProgressReporter::new(),
            device_id,
            transfer_attempts: 0,
            reconnect_attempts: 0,
            last_status: None,
        }
    }

    /// Replace the configuration. It is validated when the session runs.
    pub fn with_config(mut self, config: OtaConfig) -> Self {
        self.config = config;
        self
    }

    /// Observe `interrupt` at every suspension point.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Receiver for live progress snapshots.
    pub fn subscribe_progress(&self) -> watch::Receiver<UpdateProgress> {
        self.progress.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &OtaConfig {
        &self.config
    }

    /// Identifier of the target device.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Flash `image` and report how it went.
    ///
    /// `current_version` is what the device runs now, if the caller knows;
    /// together with the image's embedded version it decides whether
    /// `policy` is consulted. This never panics and never returns early with
    /// an error: every failure ends up in [`UpdateOutcome::error`].
    pub async fn run(
        mut self,
        image: &FirmwareImage,
        current_version: Option<&VersionCode>,
        policy: &dyn UpdatePolicy,
    ) -> UpdateOutcome {
        let started = Instant::now();
        info!(
            device = %self.device_id,
            image = image.name().unwrap_or_default(),
            size = image.size(),
            md5 = image.checksum(),
            "Starting OTA update"
        );

        let result = match self.preflight(image, current_version, policy) {
            Ok(()) => self.flash(image).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result
            && e.requires_abort()
        {
            self.abort_best_effort().await;
        }
        let transport = if result.is_ok() {
            self.release().await;
            None
        } else {
            self.transport.take()
        };

        let (success, new_version, error) = match result {
            Ok(()) => {
                let new_version = self.reconfirm().await;
                self.progress.phase(UpdatePhase::Completed);
                info!(
                    device = %self.device_id,
                    new_version = ?new_version.as_ref().map(VersionCode::as_str),
                    elapsed_ms = started.elapsed().as_millis(),
                    "OTA update succeeded"
                );
                (true, new_version, None)
            }
            Err(e) => {
                self.progress.phase(UpdatePhase::Failed);
                error!(device = %self.device_id, error = %e, "OTA update failed");
                (false, None, Some(e))
            }
        };

        UpdateOutcome {
            success,
            new_version,
            error,
            device_id: self.device_id,
            previous_version: current_version.cloned(),
            image_size: image.size(),
            checksum: image.checksum().to_string(),
            image_name: image.name().map(str::to_string),
            transfer_attempts: self.transfer_attempts,
            reconnect_attempts: self.reconnect_attempts,
            last_status: self.last_status,
            duration: started.elapsed(),
            transport,
        }
    }

    /// Checks that need no device I/O.
    fn preflight(
        &self,
        image: &FirmwareImage,
        current_version: Option<&VersionCode>,
        policy: &dyn UpdatePolicy,
    ) -> Result<(), OtaError> {
        self.config.validate()?;
        if u32::try_from(image.size()).is_err() {
            return Err(OtaError::ImageTooLarge(image.size()));
        }

        self.progress.phase(UpdatePhase::CheckingVersion);
        if let Some(question) = evaluate_gate(current_version, image.embedded_version()) {
            info!(device = %self.device_id, %question, "Asking update policy");
            if !policy.confirm(question) {
                return Err(OtaError::Cancelled(question));
            }
        }
        Ok(())
    }

    /// START through REBOOT. Returns once `REBOOT` has been attempted.
    async fn flash(&mut self, image: &FirmwareImage) -> Result<(), OtaError> {
        let Some(transport) = self.transport.as_deref_mut() else {
            return Err(OtaError::NotConnected);
        };
        if !self.interrupt.run(transport.is_connected()).await? {
            return Err(OtaError::NotConnected);
        }

        // START
        self.progress.phase(UpdatePhase::Starting);
        let start = Command::start(image.size())?;
        info!(device = %self.device_id, size = image.size(), "Starting OTA");
        self.interrupt.run(send_command(transport, start)).await??;
        let status = settle_and_read(transport, &self.interrupt, self.config.start_settle).await?;
        self.last_status = Some(status);
        if status.is_error() {
            return Err(OtaError::Device(status.error));
        }

        // Data
        let engine = ChunkedTransferEngine::from_config(&self.config);
        let transferred = engine
            .transfer(transport, image, &self.interrupt, &self.progress)
            .await;
        self.transfer_attempts = self.progress.snapshot().attempt;
        transferred?;

        // END + verify
        self.progress.phase(UpdatePhase::Verifying);
        info!(device = %self.device_id, "Verifying firmware");
        self.interrupt
            .run(send_command(transport, Command::End))
            .await??;
        let status = settle_and_read(transport, &self.interrupt, self.config.verify_settle).await?;
        self.last_status = Some(status);
        match status.state {
            DeviceState::Completed => {}
            DeviceState::Error => return Err(OtaError::Device(status.error)),
            other => return Err(OtaError::UnexpectedState(other)),
        }

        // REBOOT; the device may drop the link before acknowledging, or
        // never acknowledge at all.
        self.progress.phase(UpdatePhase::Rebooting);
        self.interrupt.sleep(self.config.pre_reboot_delay).await?;
        info!(device = %self.device_id, "Rebooting device");
        let reboot = timeout(
            self.config.abort_timeout,
            send_command(transport, Command::Reboot),
        );
        match self.interrupt.run(reboot).await {
            Ok(result) => {
                discard("reboot", result.unwrap_or(Err(TransportError::Timeout)));
            }
            Err(Interrupted) => {
                warn!(device = %self.device_id, "Interrupted while sending REBOOT");
            }
        }
        Ok(())
    }

    async fn abort_best_effort(&mut self) {
        let Some(transport) = self.transport.as_deref_mut() else {
            return;
        };
        debug!(device = %self.device_id, "Sending best-effort ABORT");
        let result = timeout(
            self.config.abort_timeout,
            send_command(transport, Command::Abort),
        )
        .await
        .unwrap_or(Err(TransportError::Timeout));
        discard("abort", result);
    }

    /// Drop the live connection once the device has been told to reboot.
    async fn release(&mut self) {
        if let Some(mut transport) = self.transport.take()
            && timeout(self.config.abort_timeout, transport.disconnect())
                .await
                .is_err()
        {
            warn!(device = %self.device_id, "Disconnect timed out");
        }
    }

    /// Wait out the reboot, then reconnect until the device reports a
    /// version. `None` when it never does or the session is interrupted.
    async fn reconfirm(&mut self) -> Option<VersionCode> {
        self.progress.phase(UpdatePhase::AwaitingReboot);
        info!(
            device = %self.device_id,
            wait_ms = self.config.reboot_wait.as_millis(),
            "Waiting for device to reboot"
        );
        if self.interrupt.sleep(self.config.reboot_wait).await.is_err() {
            warn!(device = %self.device_id, "Interrupted before reconnecting");
            return None;
        }

        self.progress.phase(UpdatePhase::Reconfirming);
        let attempts = self.config.reconfirm_attempts;
        for attempt in 1..=attempts {
            self.reconnect_attempts = attempt;
            let Ok(result) = self.interrupt.run(read_new_version(&*self.connector)).await else {
                warn!(device = %self.device_id, "Interrupted while reconnecting");
                return None;
            };
            match result {
                Ok(Some(version)) => {
                    info!(device = %self.device_id, attempt, %version, "Device reports new version");
                    return Some(VersionCode::parse(&version));
                }
                Ok(None) => {
                    warn!(device = %self.device_id, attempt, "Device reported an empty version");
                }
                Err(e) => {
                    warn!(device = %self.device_id, attempt, error = %e, "Reconnect failed");
                }
            }

            if attempt < attempts
                && self
                    .interrupt
                    .sleep(self.config.reconfirm_retry_delay)
                    .await
                    .is_err()
            {
                return None;
            }
        }

        warn!(
            device = %self.device_id,
            attempts,
            "Could not confirm new version; the update itself completed"
        );
        None
    }
}

async fn settle_and_read(
    transport: &mut dyn GattTransport,
    interrupt: &Interrupt,
    settle: Duration,
) -> Result<DeviceStatus, OtaError> {
    interrupt.sleep(settle).await?;
    interrupt.run(read_status(transport)).await?
}

/// Fresh connection, one Version read, disconnect.
async fn read_new_version(connector: &dyn Connector) -> Result<Option<String>, OtaError> {
    let mut transport = connector.connect().await?;
    let version = read_version(&mut *transport).await;
    transport.disconnect().await;
    version
}
