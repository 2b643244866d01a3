//! Host lifecycle tracking
//!
//! Holds the process-wide "host is foreground-active" flag. Only the three host
//! notifications write it; everything else reads.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Lifecycle notification from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Resumed,
    Paused,
    Destroyed,
}

impl LifecycleEvent {
    /// Foreground state after this notification
    pub fn is_foreground(self) -> bool {
        matches!(self, LifecycleEvent::Resumed)
    }
}

/// Tracks whether the host application is in the foreground
///
/// Starts in the background: a host must report a resume before the first
/// authentication can be accepted.
#[derive(Debug)]
pub struct LifecycleTracker {
    foreground: AtomicBool,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self {
            foreground: AtomicBool::new(false),
        }
    }

    pub fn on_host_resume(&self) {
        self.notify(LifecycleEvent::Resumed);
    }

    pub fn on_host_pause(&self) {
        self.notify(LifecycleEvent::Paused);
    }

    pub fn on_host_destroy(&self) {
        self.notify(LifecycleEvent::Destroyed);
    }

    /// Apply a notification unconditionally
    fn notify(&self, event: LifecycleEvent) {
        self.foreground.store(event.is_foreground(), Ordering::SeqCst);
        debug!("Host lifecycle: {:?}", event);
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}
