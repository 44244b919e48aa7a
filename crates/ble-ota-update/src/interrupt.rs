//! Cooperative cancellation for a running update.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Returned by interruptible waits once the handle has fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted")]
pub struct Interrupted;

/// Create a connected handle/signal pair.
pub fn interrupt_pair() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx: Arc::new(tx) }, Interrupt { rx: Some(rx) })
}

/// Caller side: fires the interrupt. Cheap to clone and move into a signal
/// handler task.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl InterruptHandle {
    /// Request the update to stop at its next suspension point.
    pub fn interrupt(&self) {
        self.tx.send_modify(|fired| *fired = true);
    }

    /// Whether [`interrupt`](Self::interrupt) has been called.
    pub fn is_interrupted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Engine side: observed at every await point of the update.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: Option<watch::Receiver<bool>>,
}

impl Interrupt {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether the interrupt has fired.
    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail fast when already interrupted.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_triggered() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    /// Resolves once the interrupt fires. Pends forever if the handle was
    /// dropped without firing.
    pub async fn triggered(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless interrupted first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.run(tokio::time::sleep(duration)).await
    }

    /// Drive `fut` to completion unless interrupted first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;
        tokio::select! {
            biased;
            () = self.triggered() => Err(Interrupted),
            out = fut => Ok(out),
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn never_does_not_fire() {
        let interrupt = Interrupt::never();
        assert_eq!(interrupt.sleep(Duration::from_secs(5)).await, Ok(()));
        assert!(!interrupt.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn fired_before_wait() {
        let (handle, interrupt) = interrupt_pair();
        handle.interrupt();
        assert!(handle.is_interrupted());
        assert_eq!(interrupt.sleep(Duration::from_secs(5)).await, Err(Interrupted));
    }

    #[tokio::test(start_paused = true)]
    async fn fired_during_sleep() {
        let (handle, interrupt) = interrupt_pair();
        let waiter = tokio::spawn(async move { interrupt.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.interrupt();
        assert_eq!(waiter.await.ok(), Some(Err(Interrupted)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_never_fires() {
        let (handle, interrupt) = interrupt_pair();
        drop(handle);
        assert_eq!(interrupt.run(async { 7 }).await, Ok(7));
    }
}
