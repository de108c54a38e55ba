//! Serialized access to the shared diagnostic channel.

use std::time::Duration;

use thread_info::{DiagnosticChannel, ThreadStats};
use tokio::sync::Mutex;

/// Pause taken while holding the lock, so contention between workers is
/// visible in the provider's statistics.
pub const DEFAULT_LOCK_PAUSE: Duration = Duration::from_millis(1);

/// Owns the diagnostic channel behind a single lock.
///
/// Workers only reach the channel through [`Coordinator::report`], so
/// exchanges never interleave; their order is lock-acquisition order.
pub struct Coordinator {
    channel: Mutex<Box<dyn DiagnosticChannel>>,
    pause: Duration,
}

impl Coordinator {
    pub fn new(channel: Box<dyn DiagnosticChannel>) -> Self {
        Self {
            channel: Mutex::new(channel),
            pause: DEFAULT_LOCK_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Performs one exchange for `pid` inside the critical section.
    pub async fn report(&self, pid: u32) -> Result<ThreadStats, thread_info::Error> {
        let channel = self.channel.lock().await;
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
        channel.query(pid).await
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("pause", &self.pause)
            .finish_non_exhaustive()
    }
}
