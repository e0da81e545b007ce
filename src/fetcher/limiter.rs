use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    acquisitions: AtomicUsize,
}

/// Counting admission gate capping simultaneous requests.
///
/// Slots are handed out in FIFO order. A slot is held by the returned
/// [`LimiterPermit`] and freed when it is dropped.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    gauge: Arc<Gauge>,
}

/// A reserved limiter slot.
#[derive(Debug)]
pub struct LimiterPermit {
    gauge: Arc<Gauge>,
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            gauge: Arc::new(Gauge::default()),
        }
    }

    pub async fn acquire(&self) -> LimiterPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore closed");

        self.gauge.acquisitions.fetch_add(1, Ordering::SeqCst);
        let current = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(current, Ordering::SeqCst);

        LimiterPermit {
            gauge: self.gauge.clone(),
            _permit: permit,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.gauge.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at once since creation.
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.gauge.acquisitions.load(Ordering::SeqCst)
    }
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped.
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
