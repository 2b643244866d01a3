//! The authentication session state machine
//!
//! Idle -> Probing -> (Rejected | Dispatched) -> Terminal -> Idle.
//!
//! `authenticate()` never blocks. Rejections before probing are silent at the
//! callback level: nothing fires and no state changes. Capability failures are
//! reported synchronously through the callbacks. Everything else is reported later
//! by the tier strategy, exactly once.
//!
//! The latch only spans the legacy ceremony. A modern-tier attempt releases it
//! before its prompt starts, so a modern attempt can start while an unrelated legacy
//! dialog from another session owner is still finishing.

use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::config::{AuthConfig, SessionConfig};
use crate::credential::CredentialProvider;
use crate::error::Result;
use crate::executor::PromptExecutor;
use crate::latch::SessionLatch;
use crate::lifecycle::LifecycleTracker;
use crate::platform::Platform;
use crate::probe::CapabilityProbe;
use crate::sink::ResultSink;
use crate::strategy::{CeremonyContext, LegacyPromptStrategy, ModernPromptStrategy, Strategy};
use crate::types::{CapabilityTier, ErrorCode, ProbeResult, Support, TerminalResult};

/// Why a call was rejected without any callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A legacy ceremony is already in flight
    InFlight,
    /// The host is not in the foreground
    Background,
    /// No foreground host context is attached
    NoHost,
    /// The host left the foreground between probe and present
    LostForeground,
}

/// What happened to one authenticate() call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Nothing fired and nothing will
    Rejected(Rejection),
    /// The terminal callback has already fired
    Completed,
    /// A ceremony was dispatched; its terminal callback fires later
    Pending,
}

/// Orchestrates probing, strategy selection and result delivery
pub struct AuthenticationSession {
    config: SessionConfig,
    platform: Arc<dyn Platform>,
    probe: CapabilityProbe,
    lifecycle: Arc<LifecycleTracker>,
    latch: Arc<SessionLatch>,
    legacy: LegacyPromptStrategy,
    modern: ModernPromptStrategy,
}

impl AuthenticationSession {
    /// Create a session and start its prompt executor
    pub fn new(
        config: SessionConfig,
        platform: Arc<dyn Platform>,
        credentials: Arc<dyn CredentialProvider>,
        lifecycle: Arc<LifecycleTracker>,
    ) -> Result<Self> {
        config.validate()?;
        let executor = PromptExecutor::spawn("fpauth-prompt")?;

        Ok(Self {
            config,
            probe: CapabilityProbe::new(Arc::clone(&platform)),
            platform,
            lifecycle,
            latch: Arc::new(SessionLatch::new()),
            legacy: LegacyPromptStrategy::new(credentials),
            modern: ModernPromptStrategy::new(executor),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleTracker> {
        &self.lifecycle
    }

    /// Whether a legacy ceremony currently holds the latch
    pub fn is_in_flight(&self) -> bool {
        self.latch.is_in_flight()
    }

    pub fn probe(&self) -> ProbeResult {
        self.probe.probe()
    }

    /// Supported only when the probed status is Supported
    ///
    /// Unlike authenticate(), this always answers: with no host attached the probe
    /// reports NotAvailable on the legacy and modern tiers, so the query returns
    /// `NotSupported(NOT_AVAILABLE)` instead of staying silent.
    pub fn is_supported(&self) -> Support {
        let result = self.probe.probe();
        if result.status.is_supported() {
            Support::Supported {
                kind: self.config.supported_kind.clone(),
            }
        } else {
            Support::NotSupported {
                code: result.status.code(),
            }
        }
    }

    /// Run one attempt, reporting through an onError / onSuccess pair
    pub fn authenticate<E, S>(
        &self,
        reason: &str,
        config: &AuthConfig,
        on_error: E,
        on_success: S,
    ) -> Admission
    where
        E: FnOnce(String, ErrorCode) + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        self.authenticate_with(reason, config, ResultSink::from_callbacks(on_error, on_success))
    }

    /// Run one attempt, delivering into a oneshot channel
    ///
    /// A rejected call returns the reason instead of a receiver.
    pub fn authenticate_async(
        &self,
        reason: &str,
        config: &AuthConfig,
    ) -> std::result::Result<oneshot::Receiver<TerminalResult>, Rejection> {
        let (sink, rx) = ResultSink::channel();
        match self.authenticate_with(reason, config, sink) {
            Admission::Rejected(rejection) => Err(rejection),
            Admission::Completed | Admission::Pending => Ok(rx),
        }
    }

    /// Run one attempt against an arbitrary sink
    pub fn authenticate_with(&self, reason: &str, config: &AuthConfig, sink: ResultSink) -> Admission {
        let Some(host) = self.platform.current_host() else {
            debug!("Rejecting authenticate: no foreground host");
            return Admission::Rejected(Rejection::NoHost);
        };

        if !self.lifecycle.is_foreground() {
            debug!("Rejecting authenticate: host in background");
            return Admission::Rejected(Rejection::Background);
        }

        let Some(guard) = self.latch.try_begin() else {
            debug!("Rejecting authenticate: attempt already in flight");
            return Admission::Rejected(Rejection::InFlight);
        };

        let attempt = Uuid::new_v4();
        let probed = self.probe.probe();
        let span = info_span!("authenticate", attempt = %attempt, tier = ?probed.tier);
        let _entered = span.enter();

        if !probed.status.is_supported() {
            info!("Biometrics unavailable: {:?}", probed.status);
            guard.end();
            sink.complete(TerminalResult::not_supported(probed.status.code()));
            return Admission::Completed;
        }

        let Some(strategy) = self.strategy_for(probed.tier) else {
            guard.end();
            sink.complete(TerminalResult::not_supported(ErrorCode::NotSupported));
            return Admission::Completed;
        };

        let ctx = CeremonyContext {
            attempt,
            host,
            text: config.resolve(reason, &self.config),
            sink,
            guard,
            lifecycle: Arc::clone(&self.lifecycle),
        };

        let admission = strategy.begin(ctx);
        debug!("Attempt dispatched: {:?}", admission);
        admission
    }

    /// Cancel the current modern-tier prompt; false when there is none
    pub fn cancel(&self) -> bool {
        self.modern.cancel()
    }

    /// Cancel any current modern-tier prompt and stop its executor
    ///
    /// Later modern-tier attempts report NOT_AVAILABLE. Legacy dialogs are unaffected.
    pub fn shutdown(&self) {
        info!("Shutting down authentication session");
        self.modern.shutdown();
    }

    fn strategy_for(&self, tier: CapabilityTier) -> Option<&dyn Strategy> {
        match tier {
            CapabilityTier::LegacyAvailable => Some(&self.legacy),
            CapabilityTier::ModernAvailable => Some(&self.modern),
            CapabilityTier::Unsupported => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CeremonyScript, DeviceProfile, SimEvent, SimulatedPlatform};

    fn session_for(profile: DeviceProfile) -> (AuthenticationSession, SimulatedPlatform) {
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

    #[test]
    fn test_no_host_is_silent() {
        let (session, _) = session_for(DeviceProfile {
            host_present: false,
            ..DeviceProfile::legacy()
        });
        let (sink, mut rx) = ResultSink::channel();

        let admission = session.authenticate_with("r", &AuthConfig::default(), sink);
        assert_eq!(admission, Admission::Rejected(Rejection::NoHost));
        assert!(rx.try_recv().is_err());
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_capability_failure_is_synchronous() {
        let (session, _) = session_for(DeviceProfile {
            hardware_present: false,
            ..DeviceProfile::legacy()
        });

        let mut rx = session
            .authenticate_async("r", &AuthConfig::default())
            .unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            TerminalResult::not_supported(ErrorCode::NotPresent)
        );
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_legacy_holds_latch_until_dialog_dismissed() {
        let (session, platform) = session_for(DeviceProfile {
            legacy_script: CeremonyScript::Hold,
            ..DeviceProfile::legacy()
        });

        let mut rx = session
            .authenticate_async("r", &AuthConfig::default())
            .unwrap();
        assert!(session.is_in_flight());

        let dialog = platform.take_held_dialog().unwrap();
        dialog.handler().on_success();
        assert_eq!(rx.try_recv().unwrap(), TerminalResult::Success);
        assert!(session.is_in_flight());

        drop(dialog);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_legacy_scripted_events() {
        let (session, _) = session_for(DeviceProfile {
            legacy_script: CeremonyScript::Play(vec![SimEvent::Cancel]),
            ..DeviceProfile::legacy()
        });

        let mut rx = session
            .authenticate_async("r", &AuthConfig::default())
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), TerminalResult::cancelled());
    }

    #[test]
    fn test_is_supported_reports_kind_label() {
        let (session, _) = session_for(DeviceProfile::modern());
        assert_eq!(
            session.is_supported(),
            Support::Supported {
                kind: "Fingerprint".to_string()
            }
        );
    }
}
