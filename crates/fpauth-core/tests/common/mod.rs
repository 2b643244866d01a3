//! Shared helpers for fpauth-core integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fpauth_core::sim::{DeviceProfile, SimulatedPlatform};
use fpauth_core::{AuthenticationSession, ErrorCode, LifecycleTracker, SessionConfig};

/// One callback invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error(String, ErrorCode),
}

/// Records every onError / onSuccess invocation
#[derive(Clone, Default)]
pub struct Recorder {
    outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(&self) -> impl FnOnce(String, ErrorCode) + Send + 'static {
        let outcomes = Arc::clone(&self.outcomes);
        move |message, code| outcomes.lock().unwrap().push(Outcome::Error(message, code))
    }

    pub fn on_success(&self) -> impl FnOnce() + Send + 'static {
        let outcomes = Arc::clone(&self.outcomes);
        move || outcomes.lock().unwrap().push(Outcome::Success)
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().unwrap().clone()
    }

    /// Wait until at least `count` outcomes arrived, then a little longer so that
    /// duplicates would have time to show up
    pub async fn settle(&self, count: usize) -> Vec<Outcome> {
        for _ in 0..100 {
            if self.outcomes.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.outcomes()
    }
}

/// Foreground session over a simulated device
pub fn session_for(profile: DeviceProfile) -> (AuthenticationSession, SimulatedPlatform) {
    let platform = SimulatedPlatform::new(profile);
    let lifecycle = Arc::new(LifecycleTracker::new());
    lifecycle.on_host_resume();

    let session = AuthenticationSession::new(
        SessionConfig::default(),
        Arc::new(platform.clone()),
        platform.credential_provider(),
        lifecycle,
    )
    .unwrap();

    (session, platform)
}
