//! Single-flight latch
//!
//! At most one [`FlightGuard`] exists per latch at any instant. The guard clears the
//! latch when ended explicitly or when dropped, so no terminal path can leave the
//! latch stuck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "An authentication attempt is in flight"
#[derive(Debug, Default)]
pub struct SessionLatch {
    in_flight: AtomicBool,
}

impl SessionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Set the latch if it is clear; `None` when another attempt holds it
    pub fn try_begin(self: &Arc<Self>) -> Option<FlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FlightGuard {
                latch: Arc::clone(self),
                released: false,
            })
    }
}

/// Ownership of the set latch
#[derive(Debug)]
pub struct FlightGuard {
    latch: Arc<SessionLatch>,
    released: bool,
}

impl FlightGuard {
    /// Clear the latch
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.latch.in_flight.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.release();
    }
}
