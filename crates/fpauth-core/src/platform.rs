//! Platform capability providers
//!
//! Everything the session needs from the host operating system sits behind these
//! traits: API generation, the foreground host context, the legacy fingerprint and
//! keyguard managers, the unified biometric manager, and the two ceremony renderers.

use std::sync::Arc;

use crate::cancel::CancellationSignal;
use crate::strategy::legacy::FingerprintDialog;
use crate::strategy::modern::{PromptEvents, PromptInfo};

/// First API generation that exposes any biometric API
pub const MIN_BIOMETRIC_API: u32 = 23;

/// First API generation that exposes the unified biometric manager
pub const UNIFIED_BIOMETRIC_API: u32 = 29;

/// Result codes returned by [`BiometricManager::can_authenticate`]
pub mod biometric_codes {
    pub const BIOMETRIC_SUCCESS: i32 = 0;
    pub const BIOMETRIC_ERROR_HW_UNAVAILABLE: i32 = 1;
    pub const BIOMETRIC_ERROR_NONE_ENROLLED: i32 = 11;
    pub const BIOMETRIC_ERROR_NO_HARDWARE: i32 = 12;
}

/// The runtime environment
pub trait Platform: Send + Sync {
    /// Platform API generation of the running device
    fn api_level(&self) -> u32;

    /// Foreground host context, if one is attached
    fn current_host(&self) -> Option<Arc<dyn HostContext>>;
}

/// A foreground host (activity) through which platform services are reached
pub trait HostContext: Send + Sync {
    fn fingerprint_manager(&self) -> Option<Arc<dyn FingerprintManager>>;

    fn keyguard_manager(&self) -> Option<Arc<dyn KeyguardManager>>;

    fn biometric_manager(&self) -> Option<Arc<dyn BiometricManager>>;

    /// Renderer for the custom legacy dialog
    fn dialog_presenter(&self) -> Arc<dyn DialogPresenter>;

    /// Launcher for the unified platform prompt
    fn prompt_launcher(&self) -> Arc<dyn PromptLauncher>;
}

/// Legacy-tier fingerprint hardware
pub trait FingerprintManager: Send + Sync {
    fn is_hardware_detected(&self) -> bool;

    fn has_enrolled_fingerprints(&self) -> bool;
}

/// Screen lock state
pub trait KeyguardManager: Send + Sync {
    /// Whether the device is secured by a PIN, pattern or password
    fn is_keyguard_secure(&self) -> bool;
}

/// Unified-tier biometric manager
pub trait BiometricManager: Send + Sync {
    /// One of [`biometric_codes`], or any other platform-defined value
    fn can_authenticate(&self) -> i32;
}

/// Presents the legacy fingerprint dialog
///
/// The presenter owns the dialog from here on and dismisses it by dropping it. The
/// single-flight latch stays set until then, so a presenter should drop the dialog
/// as soon as `handler().is_finished()`. Dropping it before any result ends the
/// attempt without a callback.
pub trait DialogPresenter: Send + Sync {
    fn present(&self, dialog: FingerprintDialog);
}

/// Starts the unified platform prompt
///
/// Events may be emitted from any thread; they are consumed on the session's
/// prompt executor.
pub trait PromptLauncher: Send + Sync {
    fn authenticate(&self, prompt: PromptInfo, cancel: CancellationSignal, events: PromptEvents);
}
