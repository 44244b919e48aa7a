//! Read-only progress snapshots for observers of a running update.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Phase of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdatePhase {
    /// Not started
    #[default]
    Idle,
    /// Consulting the update policy
    CheckingVersion,
    /// `START` sent, waiting for the device to prepare
    Starting,
    /// Streaming Data packets
    Transferring,
    /// `END` sent, device verifying
    Verifying,
    /// `REBOOT` sent
    Rebooting,
    /// Waiting for the device to come back
    AwaitingReboot,
    /// Reconnecting to read the new version
    Reconfirming,
    /// Update finished successfully
    Completed,
    /// Update failed
    Failed,
}

/// Point-in-time view of update progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProgress {
    /// Current phase
    pub phase: UpdatePhase,

    /// Transfer attempt, 1-based; 0 before the transfer
    pub attempt: u32,

    /// Bytes sent in the current attempt
    pub bytes_sent: u64,

    /// Image size
    pub total_bytes: u64,

    /// Packets sent in the current attempt
    pub packets_sent: u64,

    /// Throughput of the current attempt in bytes per second
    pub transfer_rate_bps: u64,
}

impl UpdateProgress {
    /// Percentage of the image sent in the current attempt.
    pub fn percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64 * 100.0) as f32
    }
}

/// Publishes progress snapshots to any number of subscribers.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<UpdateProgress>,
}

impl ProgressReporter {
    /// Reporter starting at [`UpdatePhase::Idle`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UpdateProgress::default());
        Self { tx }
    }

    /// Receiver that always sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<UpdateProgress> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> UpdateProgress {
        self.tx.borrow().clone()
    }

    /// Move to `phase`.
    pub fn phase(&self, phase: UpdatePhase) {
        self.tx.send_modify(|p| p.phase = phase);
    }

    /// Begin a transfer attempt, clearing per-attempt counters.
    pub fn begin_attempt(&self, attempt: u32, total_bytes: u64) {
        self.tx.send_modify(|p| {
            p.phase = UpdatePhase::Transferring;
            p.attempt = attempt;
            p.bytes_sent = 0;
            p.packets_sent = 0;
            p.total_bytes = total_bytes;
            p.transfer_rate_bps = 0;
        });
    }

    /// Record one delivered packet.
    pub fn packet_sent(&self, payload_len: usize, rate_bps: u64) {
        self.tx.send_modify(|p| {
            p.bytes_sent = p.bytes_sent.saturating_add(payload_len as u64);
            p.packets_sent = p.packets_sent.saturating_add(1);
            p.transfer_rate_bps = rate_bps;
        });
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_resets_counters() {
        let reporter = ProgressReporter::new();
        let rx = reporter.subscribe();
        reporter.begin_attempt(1, 1000);
        reporter.packet_sent(500, 0);
        assert_eq!(rx.borrow().bytes_sent, 500);
        assert!((rx.borrow().percent() - 50.0).abs() < f32::EPSILON);

        reporter.begin_attempt(2, 1000);
        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.attempt, 2);
        assert_eq!(snapshot.bytes_sent, 0);
        assert_eq!(snapshot.packets_sent, 0);
    }

    #[test]
    fn percent_of_empty_total() {
        assert_eq!(UpdateProgress::default().percent(), 0.0);
    }
}
