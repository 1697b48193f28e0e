//! Cooperative cancellation for batch runs
//!
//! A [`CancelHandle`] is held by whoever controls the run (the CLI wires it to
//! Ctrl-C); [`CancelToken`]s are cloned into the fetcher and the batch driver, which
//! race their network calls and sleeps against [`CancelToken::cancelled`].

use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

use crate::error::Error as CrateError;

/// The run was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

impl From<Cancelled> for CrateError {
    fn from(_: Cancelled) -> Self {
        CrateError::Cancelled
    }
}

/// Requests cancellation of every token created from it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A token observing this handle
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes a [`CancelHandle`]
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Handle dropped without cancelling
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless cancellation wins the race
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, returning early on cancellation
    pub async fn sleep(&self, duration: std::time::Duration) -> Result<(), Cancelled> {
        self.run(tokio::time::sleep(duration)).await
    }
}
