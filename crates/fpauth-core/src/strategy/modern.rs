//! Modern tier: unified platform biometric prompt
//!
//! The platform prompt provides its own modal exclusivity, so the latch is released
//! before the prompt starts. Prompt events are pumped on the session's
//! [`PromptExecutor`]. Failed-match and help events are swallowed: the platform UI
//! guides the user through them. Only success, a platform authentication error, or
//! an explicit cancel reaches the caller.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{CeremonyContext, Strategy};
use crate::cancel::CancellationSignal;
use crate::config::PromptText;
use crate::executor::PromptExecutor;
use crate::session::Admission;
use crate::sink::ResultSink;
use crate::types::{ErrorCode, TerminalResult};

/// Rendered configuration of the platform prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInfo {
    pub title: String,
    pub description: String,
    /// Text on the cancel button
    pub negative_button_text: String,
    /// Require an explicit confirm press after passive (face/iris) matches
    pub confirmation_required: bool,
    /// Allow PIN/pattern/password instead of a biometric
    pub device_credential_allowed: bool,
}

impl PromptInfo {
    pub fn from_text(text: PromptText) -> Self {
        Self {
            title: text.title,
            description: text.description,
            negative_button_text: text.cancel_text,
            confirmation_required: false,
            device_credential_allowed: false,
        }
    }
}

/// Callback events emitted by the platform prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Succeeded,
    /// Biometric read but not matched
    Failed,
    Help { code: i32, message: String },
    Error { code: i32, message: String },
    /// The user pressed the cancel button
    NegativeButton,
}

/// Event sender handed to the platform prompt
#[derive(Debug, Clone)]
pub struct PromptEvents {
    tx: mpsc::UnboundedSender<PromptEvent>,
}

impl PromptEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PromptEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event; false once the ceremony has finished
    pub fn emit(&self, event: PromptEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn succeeded(&self) -> bool {
        self.emit(PromptEvent::Succeeded)
    }

    pub fn failed(&self) -> bool {
        self.emit(PromptEvent::Failed)
    }

    pub fn help(&self, code: i32, message: impl Into<String>) -> bool {
        self.emit(PromptEvent::Help {
            code,
            message: message.into(),
        })
    }

    pub fn error(&self, code: i32, message: impl Into<String>) -> bool {
        self.emit(PromptEvent::Error {
            code,
            message: message.into(),
        })
    }

    pub fn negative_button(&self) -> bool {
        self.emit(PromptEvent::NegativeButton)
    }
}

struct ActivePrompt {
    attempt: Uuid,
    cancel: CancellationSignal,
    sink: ResultSink,
}

/// Strategy for [`crate::CapabilityTier::ModernAvailable`]
pub struct ModernPromptStrategy {
    executor: PromptExecutor,
    active: Mutex<Option<ActivePrompt>>,
}

impl ModernPromptStrategy {
    pub fn new(executor: PromptExecutor) -> Self {
        Self {
            executor,
            active: Mutex::new(None),
        }
    }

    /// Cancel the most recent prompt on behalf of the host
    ///
    /// Returns false when there is no prompt left to cancel.
    pub fn cancel(&self) -> bool {
        let active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match active {
            Some(prompt) if !prompt.sink.is_completed() => {
                debug!("Host cancelled attempt {}", prompt.attempt);
                prompt.cancel.cancel();
                prompt.sink.complete(TerminalResult::cancelled())
            }
            _ => false,
        }
    }

    /// Cancel the pending prompt and stop the event executor
    pub fn shutdown(&self) {
        self.cancel();
        self.executor.shutdown();
    }
}

impl Strategy for ModernPromptStrategy {
    fn begin(&self, ctx: CeremonyContext) -> Admission {
        let CeremonyContext {
            attempt,
            host,
            text,
            sink,
            guard,
            ..
        } = ctx;

        guard.end();

        let cancel = CancellationSignal::new();
        let prompt = PromptInfo::from_text(text);
        let (events, rx) = PromptEvents::channel();

        let pump = pump_events(attempt, rx, cancel.clone(), sink.clone());
        if let Err(e) = self.executor.execute(pump) {
            error!("Cannot start prompt for attempt {}: {}", attempt, e);
            sink.complete(TerminalResult::not_supported(ErrorCode::NotAvailable));
            return Admission::Completed;
        }

        *self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ActivePrompt {
            attempt,
            cancel: cancel.clone(),
            sink,
        });

        host.prompt_launcher().authenticate(prompt, cancel, events);
        Admission::Pending
    }
}

/// Route platform events into the sink until a terminal one arrives
async fn pump_events(
    attempt: Uuid,
    mut rx: mpsc::UnboundedReceiver<PromptEvent>,
    cancel: CancellationSignal,
    sink: ResultSink,
) {
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = cancel.cancelled() => None,
        };

        let Some(event) = event else {
            break;
        };

        match event {
            PromptEvent::Succeeded => {
                sink.complete(TerminalResult::Success);
            }
            PromptEvent::Error { code, message } => {
                debug!("Prompt error {} for attempt {}: {}", code, attempt, message);
                sink.complete(TerminalResult::failed(message));
            }
            PromptEvent::NegativeButton => {
                cancel.cancel();
                sink.complete(TerminalResult::cancelled());
            }
            PromptEvent::Failed => {
                debug!("Swallowing failed match for attempt {}", attempt);
            }
            PromptEvent::Help { code, message } => {
                debug!("Swallowing help {} for attempt {}: {}", code, attempt, message);
            }
        }

        if sink.is_completed() {
            break;
        }
    }

    if !sink.is_completed() {
        warn!("Prompt for attempt {} closed without a result", attempt);
    }
}
