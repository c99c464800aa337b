//! Bounded pool of fetch slots with acquisition jitter
//!
//! A slot authorizes one network call. Acquiring one first sleeps a random
//! delay so that freshly spawned workers do not hit the feed in lockstep.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrency limiter for page requests
#[derive(Debug)]
pub struct ConcurrencySlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    max_jitter: Duration,
}

/// A held slot; dropping it releases the slot
#[derive(Debug)]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencySlots {
    /// Creates a pool of `capacity` slots
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of slots held at once
    /// * `max_jitter` - Exclusive upper bound of the delay before each acquisition
    pub fn new(capacity: usize, max_jitter: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            max_jitter,
        }
    }

    /// Waits a random delay in `[0, max_jitter)`, then waits for a free slot
    ///
    /// Cancellation does not interrupt this call. Returns `None` once the pool
    /// has been closed, which happens when the fetch that owns it ends.
    pub async fn acquire(&self) -> Option<SlotGuard> {
        let delay = jitter(self.max_jitter);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        Some(SlotGuard { _permit: permit })
    }

    /// Refuses every pending and future acquisition; held slots stay valid
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    pub fn in_use(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

/// Picks a uniformly random delay below `max`
fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
}
