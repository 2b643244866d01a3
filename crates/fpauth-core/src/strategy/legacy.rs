//! Legacy tier: custom fingerprint dialog bound to a fresh credential
//!
//! The dialog owns the single-flight latch for its whole lifetime: the latch is only
//! cleared once the presenter dismisses (drops) the dialog. Every dialog sub-event
//! (help text, failed match, hard error, cancel) reaches the caller, and the first
//! one is terminal. The terminal event also destroys the credential, so a dialog left
//! on screen afterwards can no longer seal anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CeremonyContext, Strategy};
use crate::config::PromptText;
use crate::credential::{Credential, CredentialProvider};
use crate::error::{FpAuthError, Result};
use crate::latch::FlightGuard;
use crate::session::{Admission, Rejection};
use crate::sink::ResultSink;
use crate::types::{ErrorCode, TerminalResult, NOT_RECOGNIZED_MESSAGE};

/// Strategy for [`crate::CapabilityTier::LegacyAvailable`]
pub struct LegacyPromptStrategy {
    credentials: Arc<dyn CredentialProvider>,
}

impl LegacyPromptStrategy {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

impl Strategy for LegacyPromptStrategy {
    fn begin(&self, ctx: CeremonyContext) -> Admission {
        let CeremonyContext {
            attempt,
            host,
            text,
            sink,
            guard,
            lifecycle,
        } = ctx;

        let credential = match self.credentials.create_credential() {
            Ok(credential) => credential,
            Err(e) => {
                warn!("No credential for attempt {}: {}", attempt, e);
                guard.end();
                sink.complete(TerminalResult::not_supported(ErrorCode::NotAvailable));
                return Admission::Completed;
            }
        };
        debug!("Credential {} bound to attempt {}", credential.key_id(), attempt);

        let dialog = FingerprintDialog {
            text,
            handler: DialogResultHandler::new(attempt, sink, credential),
            _guard: guard,
        };

        // The host may have lost the foreground between probe and present
        if !lifecycle.is_foreground() {
            info!("Host left the foreground before attempt {} was shown", attempt);
            dialog.abandon();
            return Admission::Rejected(Rejection::LostForeground);
        }

        host.dialog_presenter().present(dialog);
        Admission::Pending
    }
}

/// The custom dialog handed to a [`crate::platform::DialogPresenter`]
///
/// Holds the single-flight latch until dropped.
#[derive(Debug)]
pub struct FingerprintDialog {
    text: PromptText,
    handler: DialogResultHandler,
    _guard: FlightGuard,
}

impl FingerprintDialog {
    pub fn text(&self) -> &PromptText {
        &self.text
    }

    pub fn title(&self) -> &str {
        &self.text.title
    }

    pub fn cancel_text(&self) -> &str {
        &self.text.cancel_text
    }

    /// Reason shown to the user
    pub fn reason(&self) -> &str {
        &self.text.description
    }

    pub fn handler(&self) -> &DialogResultHandler {
        &self.handler
    }

    /// Seal a payload with the bound credential, returning nonce || ciphertext
    ///
    /// Fails once the attempt has finished and the credential is gone.
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self.handler.credential().as_ref() {
            Some(credential) => credential.seal(payload),
            None => Err(FpAuthError::Credential(format!(
                "credential for attempt {} already destroyed",
                self.handler.attempt
            ))),
        }
    }

    /// Whether the credential is still bound
    pub fn has_credential(&self) -> bool {
        self.handler.credential().is_some()
    }

    /// Discard the dialog without delivering anything
    fn abandon(self) {
        self.handler.discarded.store(true, Ordering::SeqCst);
    }
}

/// Completion handler wired into the legacy dialog
pub struct DialogResultHandler {
    attempt: Uuid,
    sink: ResultSink,
    credential: Mutex<Option<Credential>>,
    discarded: AtomicBool,
}

impl DialogResultHandler {
    fn new(attempt: Uuid, sink: ResultSink, credential: Credential) -> Self {
        Self {
            attempt,
            sink,
            credential: Mutex::new(Some(credential)),
            discarded: AtomicBool::new(false),
        }
    }

    pub fn attempt(&self) -> Uuid {
        self.attempt
    }

    pub fn on_success(&self) {
        self.finish(TerminalResult::Success);
    }

    pub fn on_cancelled(&self) {
        self.finish(TerminalResult::cancelled());
    }

    /// Unrecoverable sensor or platform error
    pub fn on_error(&self, message: impl Into<String>) {
        self.finish(TerminalResult::failed(message));
    }

    /// Fingerprint read but not matched
    pub fn on_failed(&self) {
        self.finish(TerminalResult::failed(NOT_RECOGNIZED_MESSAGE));
    }

    /// Recoverable guidance from the sensor
    pub fn on_help(&self, help: impl Into<String>) {
        self.finish(TerminalResult::failed(help));
    }

    /// Whether the caller has been answered; the presenter should dismiss the dialog
    pub fn is_finished(&self) -> bool {
        self.sink.is_completed()
    }

    fn credential(&self) -> MutexGuard<'_, Option<Credential>> {
        self.credential
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn finish(&self, result: TerminalResult) {
        // Dropping the credential zeroizes its key
        self.credential().take();
        if self.sink.complete(result) {
            debug!("Attempt {} finished", self.attempt);
        }
    }
}

impl std::fmt::Debug for DialogResultHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogResultHandler")
            .field("attempt", &self.attempt)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for DialogResultHandler {
    fn drop(&mut self) {
        if !self.is_finished() && !self.discarded.load(Ordering::SeqCst) {
            warn!("Fingerprint dialog for attempt {} dismissed without a result", self.attempt);
        }
    }
}
