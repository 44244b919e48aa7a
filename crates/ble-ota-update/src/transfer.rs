//! Chunked image streaming with whole-attempt retry.
//!
//! The device assembles the image from the Data stream in arrival order and
//! has no resume support, so a fault anywhere in the stream restarts the
//! image from sequence 0 after resetting the device with `ABORT` + `START`.

use std::time::Duration;

use ble_ota_protocol::{Channel, Command, SEQ_HEADER_LEN, packetize};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::OtaConfig;
use crate::error::OtaError;
use crate::image::FirmwareImage;
use crate::interrupt::Interrupt;
use crate::progress::ProgressReporter;
use crate::transport::{GattTransport, discard, send_command};

/// Statistics of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Packets sent in the successful attempt
    pub packets: u64,
    /// Image bytes sent in the successful attempt
    pub bytes: u64,
    /// Duration of the successful attempt
    pub elapsed: Duration,
}

impl TransferReport {
    /// Payload throughput of the successful attempt in bytes per second.
    pub fn throughput_bps(&self) -> u64 {
        rate_bps(self.bytes, self.elapsed)
    }
}

fn rate_bps(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

/// Streams a firmware image over the Data channel.
#[derive(Debug, Clone)]
pub struct ChunkedTransferEngine {
    chunk_size: usize,
    pacing_interval: u32,
    pacing_delay: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    abort_settle: Duration,
    restart_settle: Duration,
}

impl ChunkedTransferEngine {
    /// Engine using the chunking, pacing and retry settings of `config`.
    pub fn from_config(config: &OtaConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            pacing_interval: config.pacing_interval,
            pacing_delay: config.pacing_delay,
            max_attempts: config.max_transfer_attempts.max(1),
            retry_delay: config.retry_delay,
            abort_settle: config.abort_settle,
            restart_settle: config.restart_settle,
        }
    }

    /// Stream `image`, retrying the whole image on transport faults.
    ///
    /// The device must already have accepted `START`. Interruption is
    /// observed before every packet and during every wait.
    ///
    /// # Errors
    ///
    /// [`OtaError::TransferFailed`] once the attempt budget is spent,
    /// [`OtaError::Interrupted`] on interrupt, and [`OtaError::Protocol`] if
    /// the image cannot be framed.
    pub async fn transfer(
        &self,
        transport: &mut dyn GattTransport,
        image: &FirmwareImage,
        interrupt: &Interrupt,
        progress: &ProgressReporter,
    ) -> Result<TransferReport, OtaError> {
        let start = Command::start(image.size())?;
        let total_packets = image.packet_count(self.chunk_size);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            progress.begin_attempt(attempt, image.size());
            info!(
                device = transport.device_id(),
                attempt,
                max_attempts = self.max_attempts,
                packets = total_packets,
                "Starting image transfer"
            );

            let started = Instant::now();
            let error = match self.stream_once(transport, image, interrupt, progress).await {
                Ok(packets) => {
                    let report = TransferReport {
                        attempts: attempt,
                        packets,
                        bytes: image.size(),
                        elapsed: started.elapsed(),
                    };
                    info!(
                        device = transport.device_id(),
                        attempts = report.attempts,
                        packets = report.packets,
                        bytes = report.bytes,
                        throughput_bps = report.throughput_bps(),
                        "Image transfer complete"
                    );
                    return Ok(report);
                }
                Err(OtaError::Transport(e)) => e,
                Err(other) => return Err(other),
            };

            warn!(
                device = transport.device_id(),
                attempt,
                error = %error,
                "Transfer attempt failed"
            );

            if attempt >= self.max_attempts || !error.is_retryable() {
                return Err(OtaError::TransferFailed {
                    attempts: attempt,
                    last_error: error,
                });
            }

            self.reset_device(transport, start, interrupt).await?;
        }
    }

    /// One pass over the image. Returns the number of packets sent.
    async fn stream_once(
        &self,
        transport: &mut dyn GattTransport,
        image: &FirmwareImage,
        interrupt: &Interrupt,
        progress: &ProgressReporter,
    ) -> Result<u64, OtaError> {
        let packets = packetize(image.data(), self.chunk_size)?;
        let mut buf = Vec::with_capacity(SEQ_HEADER_LEN.saturating_add(self.chunk_size));
        let started = Instant::now();
        let mut sent: u64 = 0;
        let mut bytes: u64 = 0;

        for packet in packets {
            interrupt.check()?;
            buf.clear();
            packet.encode_into(&mut buf);
            interrupt
                .run(transport.write(Channel::Data, &buf))
                .await??;

            sent = sent.saturating_add(1);
            bytes = bytes.saturating_add(packet.payload.len() as u64);
            progress.packet_sent(packet.payload.len(), rate_bps(bytes, started.elapsed()));
            trace!(seq = packet.seq, len = packet.payload.len(), "Sent data packet");

            if self.pacing_interval > 0 && sent.is_multiple_of(u64::from(self.pacing_interval)) {
                interrupt.sleep(self.pacing_delay).await?;
            }
        }

        Ok(sent)
    }

    /// Put the device back into a clean receiving state before a retry.
    ///
    /// Failures of the reset writes are logged and ignored; the next attempt
    /// surfaces any persistent fault.
    async fn reset_device(
        &self,
        transport: &mut dyn GattTransport,
        start: Command,
        interrupt: &Interrupt,
    ) -> Result<(), OtaError> {
        debug!(device = transport.device_id(), "Resetting device before retry");
        interrupt.sleep(self.retry_delay).await?;

        let result = interrupt.run(send_command(transport, Command::Abort)).await?;
        discard("reset abort", result);
        interrupt.sleep(self.abort_settle).await?;

        let result = interrupt.run(send_command(transport, start)).await?;
        discard("reset start", result);
        interrupt.sleep(self.restart_settle).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_of_instant_transfer_is_zero() {
        let report = TransferReport {
            attempts: 1,
            packets: 3,
            bytes: 1234,
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.throughput_bps(), 0);
    }

    #[test]
    fn throughput_over_one_second() {
        assert_eq!(rate_bps(5000, Duration::from_secs(2)), 2500);
    }

    #[test]
    fn attempts_never_zero() {
        let config = OtaConfig {
            max_transfer_attempts: 0,
            ..OtaConfig::default()
        };
        let engine = ChunkedTransferEngine::from_config(&config);
        assert_eq!(engine.max_attempts, 1);
    }
}
