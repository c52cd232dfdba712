//! Round loop pacing and cooperative shutdown.
//!
//! The live dashboard wants progress to be visible, so production runs pause
//! between steps. Tests plug in [`NoDelay`].

use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingStep { Startup, RoundStart, ClientProcessed }

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, step: PacingStep);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self, _step: PacingStep) { tokio::time::sleep(self.0).await; }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self, _step: PacingStep) {}
}

/// Requests a stop. Dropping the handle without calling [`StopHandle::stop`] never stops the run.
#[derive(Debug)]
pub struct StopHandle { tx: watch::Sender<bool> }

#[derive(Debug, Clone)]
pub struct StopSignal { rx: watch::Receiver<bool> }

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) { let _ = self.tx.send(true); }
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self { stop_channel().1 }

    pub fn is_stopped(&self) -> bool { *self.rx.borrow() }

    /// Resolves once stop has been requested.
    pub async fn stopped(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
