use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Remembers when the user last typed or navigated.
#[derive(Clone)]
pub struct ActivityMonitor {
    last_input: Arc<Mutex<Instant>>,
    idle_after: Duration,
}

impl ActivityMonitor {
    /// Starts active; becomes inactive after `idle_after` without input.
    #[must_use]
    pub fn new(idle_after: Duration) -> Self {
        Self {
            last_input: Arc::new(Mutex::new(Instant::now())),
            idle_after,
        }
    }

    /// Marks the user as active now.
    pub fn record_input(&self) {
        *self.last_input.lock() = Instant::now();
    }

    /// Whether the user typed within the idle window.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.last_input.lock().elapsed() < self.idle_after
    }
}
