//! Tier strategies
//!
//! The set is closed: [`LegacyPromptStrategy`] drives a custom-rendered dialog and
//! owns the single-flight latch for its whole ceremony, [`ModernPromptStrategy`]
//! hands the ceremony to the unified platform prompt and releases the latch up
//! front. The session picks one per call from the probed tier and never re-probes.

pub mod legacy;
pub mod modern;

pub use legacy::{DialogResultHandler, FingerprintDialog, LegacyPromptStrategy};
pub use modern::{ModernPromptStrategy, PromptEvent, PromptEvents, PromptInfo};

use std::sync::Arc;
use uuid::Uuid;

use crate::config::PromptText;
use crate::latch::FlightGuard;
use crate::lifecycle::LifecycleTracker;
use crate::platform::HostContext;
use crate::session::Admission;
use crate::sink::ResultSink;

/// Everything a strategy needs to run one ceremony
pub struct CeremonyContext {
    /// Correlates log lines of one attempt
    pub attempt: Uuid,

    /// Foreground host the call was accepted against
    pub host: Arc<dyn HostContext>,

    /// Resolved prompt text
    pub text: PromptText,

    /// Caller's callback contract
    pub sink: ResultSink,

    /// Held single-flight latch
    pub guard: FlightGuard,

    pub lifecycle: Arc<LifecycleTracker>,
}

/// Conducts the ceremony for one capability tier
pub trait Strategy: Send + Sync {
    /// Start the ceremony; the outcome is delivered through `ctx.sink`
    fn begin(&self, ctx: CeremonyContext) -> Admission;
}
