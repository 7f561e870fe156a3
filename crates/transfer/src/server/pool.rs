//! Bounded worker pool with a load-adaptive receive timeout.
//!
//! The pool tracks how many connections are active and derives the receive
//! timeout handed to each newly accepted connection: the busier the pool,
//! the shorter the timeout, so idle kept-alive connections are reclaimed
//! faster under pressure.
//!
//! Saturation has no rejection path in this protocol subset. A connection
//! past capacity is still accepted and served; only its timeout bottoms out
//! at the floor.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default capacity of the pool
pub const DEFAULT_CAPACITY: usize = 10;

/// Timeout floor, reached when no workers are available
const MIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout ceiling, granted when the pool is idle
const MAX_TIMEOUT: Duration = Duration::from_secs(20);

/// Shared count of active connections against a fixed capacity.
///
/// The count is only ever touched through [`acquire`](Self::acquire) and
/// the returned permit's `Drop`: exactly one increment and one decrement
/// per connection, from however many tasks run concurrently.
#[derive(Debug)]
pub struct WorkerPool {
    capacity: usize,
    active: AtomicUsize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        // a zero-capacity pool would make the load factor meaningless
        Self { capacity: capacity.max(1), active: AtomicUsize::new(0) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Workers not currently bound to a connection, clamped at zero when
    /// the pool runs past capacity.
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.active.load(Ordering::Acquire))
    }

    /// Claims a slot for one connection; the permit releases it on drop.
    pub fn acquire(self: &Arc<Self>) -> PoolPermit {
        self.active.fetch_add(1, Ordering::AcqRel);
        PoolPermit { pool: Arc::clone(self) }
    }

    /// The receive timeout for a connection accepted at the current load.
    pub fn adaptive_timeout(&self) -> Duration {
        self.compute_timeout(self.available())
    }

    /// `load = (capacity - available) / capacity`;
    /// `timeout = max(floor, ceiling * (1 - load))`.
    pub fn compute_timeout(&self, available: usize) -> Duration {
        let busy = self.capacity - available.min(self.capacity);
        let load = busy as f64 / self.capacity as f64;
        MAX_TIMEOUT.mul_f64(1.0 - load).max(MIN_TIMEOUT)
    }
}

/// RAII guard for one pool slot.
#[derive(Debug)]
pub struct PoolPermit {
    pool: Arc<WorkerPool>,
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.pool.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_bounds_and_monotonicity() {
        let pool = WorkerPool::new(DEFAULT_CAPACITY);

        let mut previous = Duration::ZERO;
        for available in 0..=pool.capacity() {
            let timeout = pool.compute_timeout(available);
            assert!(timeout >= MIN_TIMEOUT, "available {available}");
            assert!(timeout <= MAX_TIMEOUT, "available {available}");
            // more free capacity never shortens the timeout
            assert!(timeout >= previous, "available {available}");
            previous = timeout;
        }

        assert_eq!(pool.compute_timeout(pool.capacity()), MAX_TIMEOUT);
        assert_eq!(pool.compute_timeout(0), MIN_TIMEOUT);
    }

    #[test]
    fn permits_release_on_drop() {
        let pool = Arc::new(WorkerPool::new(3));
        assert_eq!(pool.available(), 3);

        let first = pool.acquire();
        let second = pool.acquire();
        assert_eq!(pool.available(), 1);

        drop(first);
        assert_eq!(pool.available(), 2);
        drop(second);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn oversubscription_clamps_available_to_zero() {
        let pool = Arc::new(WorkerPool::new(2));

        let _permits: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.adaptive_timeout(), MIN_TIMEOUT);
    }

    #[tokio::test]
    async fn concurrent_acquire_release_balances() {
        let pool = Arc::new(WorkerPool::new(DEFAULT_CAPACITY));

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move {
                    let permit = pool.acquire();
                    tokio::task::yield_now().await;
                    drop(permit);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(pool.available(), DEFAULT_CAPACITY);
    }
}
