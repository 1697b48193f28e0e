//! Request pacing between network fetches

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cancel::{CancelToken, Cancelled};

/// Keeps at least `period` between the end of one network fetch and the start of
/// the next
///
/// The first request passes immediately. Cache hits never consult the pacer, and
/// only requests reported through [`RequestPacer::finished`] start the gap.
#[derive(Debug)]
pub struct RequestPacer {
    period: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Gap of `period` after each request; a zero period disables pacing
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_finished: Mutex::new(None),
        }
    }

    /// A pacer that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    fn last_finished(&self) -> Option<Instant> {
        match self.last_finished.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Wait until the gap after the previous request has passed, or until
    /// cancellation
    pub async fn ready(&self, cancel: &CancelToken) -> Result<(), Cancelled> {
        let wait = self
            .last_finished()
            .map(|finished| (finished + self.period).saturating_duration_since(Instant::now()))
            .unwrap_or_default();

        if wait.is_zero() {
            return cancel.run(async {}).await;
        }
        debug!(wait_ms = wait.as_millis() as u64, "Pacing next request");
        cancel.sleep(wait).await
    }

    /// Record that a request has just completed
    pub fn finished(&self) {
        if self.period.is_zero() {
            return;
        }
        let now = Instant::now();
        match self.last_finished.lock() {
            Ok(mut guard) => *guard = Some(now),
            Err(poisoned) => *poisoned.into_inner() = Some(now),
        }
    }
}
