//! Simulated platform
//!
//! A scriptable stand-in for the device: API generation, hardware, keyguard,
//! enrollment, credential availability, and how each ceremony plays out. Ceremonies
//! scripted as [`CeremonyScript::Hold`] are parked so a test or the CLI can drive
//! them by hand.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::config::{PromptText, DEFAULT_CREDENTIAL_ALIAS};
use crate::credential::{Credential, CredentialProvider, SoftwareKeystore};
use crate::error::{FpAuthError, Result};
use crate::platform::{
    biometric_codes, BiometricManager, DialogPresenter, FingerprintManager, HostContext,
    KeyguardManager, Platform, PromptLauncher,
};
use crate::strategy::legacy::FingerprintDialog;
use crate::strategy::modern::{PromptEvents, PromptInfo};

/// Help code emitted for scripted help events (partial read)
pub const SIM_HELP_CODE: i32 = 1;

/// Error code emitted for scripted error events (lockout)
pub const SIM_ERROR_CODE: i32 = 7;

/// Payload sealed with the credential on a scripted legacy success
const CEREMONY_PAYLOAD: &[u8] = b"fpauth-ceremony";

/// One scripted ceremony step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    Success,
    Failed,
    Help { message: String },
    Error { message: String },
    Cancel,
}

/// How a ceremony plays out once presented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyScript {
    /// Park the ceremony for manual driving
    Hold,
    /// Emit these events in order, synchronously on presentation
    Play(Vec<SimEvent>),
}

impl Default for CeremonyScript {
    fn default() -> Self {
        CeremonyScript::Play(vec![SimEvent::Success])
    }
}

/// Simulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub api_level: u32,

    /// Whether a foreground host context is attached
    pub host_present: bool,

    pub hardware_present: bool,

    pub keyguard_secure: bool,

    /// Number of enrolled biometrics
    pub enrolled: u32,

    /// Whether the host exposes the unified biometric manager
    pub biometric_manager_present: bool,

    /// Raw unified-manager result; derived from the hardware fields when unset
    pub biometric_code: Option<i32>,

    pub credential_available: bool,

    pub legacy_script: CeremonyScript,

    pub modern_script: CeremonyScript,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            api_level: 29,
            host_present: true,
            hardware_present: true,
            keyguard_secure: true,
            enrolled: 1,
            biometric_manager_present: true,
            biometric_code: None,
            credential_available: true,
            legacy_script: CeremonyScript::default(),
            modern_script: CeremonyScript::default(),
        }
    }
}

impl DeviceProfile {
    /// Healthy legacy-tier device
    pub fn legacy() -> Self {
        Self {
            api_level: 28,
            ..Self::default()
        }
    }

    /// Healthy modern-tier device
    pub fn modern() -> Self {
        Self::default()
    }

    /// Device predating biometric APIs
    pub fn unsupported() -> Self {
        Self {
            api_level: 21,
            ..Self::default()
        }
    }

    /// Unified-manager code this device reports
    pub fn effective_biometric_code(&self) -> i32 {
        if let Some(code) = self.biometric_code {
            return code;
        }
        if !self.hardware_present {
            biometric_codes::BIOMETRIC_ERROR_NO_HARDWARE
        } else if self.enrolled == 0 {
            biometric_codes::BIOMETRIC_ERROR_NONE_ENROLLED
        } else {
            biometric_codes::BIOMETRIC_SUCCESS
        }
    }
}

/// A parked unified-prompt ceremony
#[derive(Debug)]
pub struct HeldPrompt {
    pub info: PromptInfo,
    pub cancel: CancellationSignal,
    pub events: PromptEvents,
}

#[derive(Default)]
struct SimState {
    profile: Mutex<DeviceProfile>,
    held_dialogs: Mutex<VecDeque<FingerprintDialog>>,
    held_prompts: Mutex<VecDeque<HeldPrompt>>,
    shown_dialogs: Mutex<Vec<PromptText>>,
    shown_prompts: Mutex<Vec<PromptInfo>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimState {
    fn profile(&self) -> DeviceProfile {
        lock(&self.profile).clone()
    }
}

/// Simulated platform; clones share one device
#[derive(Clone)]
pub struct SimulatedPlatform {
    state: Arc<SimState>,
}

impl SimulatedPlatform {
    pub fn new(profile: DeviceProfile) -> Self {
        let state = SimState {
            profile: Mutex::new(profile),
            ..SimState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    pub fn profile(&self) -> DeviceProfile {
        self.state.profile()
    }

    pub fn update_profile(&self, update: impl FnOnce(&mut DeviceProfile)) {
        update(&mut lock(&self.state.profile));
    }

    /// Credential provider honoring `credential_available`
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        self.credential_provider_for(DEFAULT_CREDENTIAL_ALIAS)
    }

    pub fn credential_provider_for(&self, alias: &str) -> Arc<dyn CredentialProvider> {
        Arc::new(SimCredentialProvider {
            state: Arc::clone(&self.state),
            keystore: SoftwareKeystore::new(alias),
        })
    }

    /// Oldest parked legacy dialog
    pub fn take_held_dialog(&self) -> Option<FingerprintDialog> {
        lock(&self.state.held_dialogs).pop_front()
    }

    /// Oldest parked unified prompt
    pub fn take_held_prompt(&self) -> Option<HeldPrompt> {
        lock(&self.state.held_prompts).pop_front()
    }

    /// Text of every legacy dialog presented so far
    pub fn shown_dialogs(&self) -> Vec<PromptText> {
        lock(&self.state.shown_dialogs).clone()
    }

    /// Configuration of every unified prompt started so far
    pub fn shown_prompts(&self) -> Vec<PromptInfo> {
        lock(&self.state.shown_prompts).clone()
    }
}

impl Platform for SimulatedPlatform {
    fn api_level(&self) -> u32 {
        self.state.profile().api_level
    }

    fn current_host(&self) -> Option<Arc<dyn HostContext>> {
        if !self.state.profile().host_present {
            return None;
        }
        Some(Arc::new(SimulatedHost {
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimulatedHost {
    state: Arc<SimState>,
}

impl HostContext for SimulatedHost {
    fn fingerprint_manager(&self) -> Option<Arc<dyn FingerprintManager>> {
        Some(Arc::new(SimDevice(Arc::clone(&self.state))))
    }

    fn keyguard_manager(&self) -> Option<Arc<dyn KeyguardManager>> {
        Some(Arc::new(SimDevice(Arc::clone(&self.state))))
    }

    fn biometric_manager(&self) -> Option<Arc<dyn BiometricManager>> {
        if !self.state.profile().biometric_manager_present {
            return None;
        }
        Some(Arc::new(SimDevice(Arc::clone(&self.state))))
    }

    fn dialog_presenter(&self) -> Arc<dyn DialogPresenter> {
        Arc::new(SimDevice(Arc::clone(&self.state)))
    }

    fn prompt_launcher(&self) -> Arc<dyn PromptLauncher> {
        Arc::new(SimDevice(Arc::clone(&self.state)))
    }
}

/// Hardware and UI of the simulated device
struct SimDevice(Arc<SimState>);

impl FingerprintManager for SimDevice {
    fn is_hardware_detected(&self) -> bool {
        self.0.profile().hardware_present
    }

    fn has_enrolled_fingerprints(&self) -> bool {
        self.0.profile().enrolled > 0
    }
}

impl KeyguardManager for SimDevice {
    fn is_keyguard_secure(&self) -> bool {
        self.0.profile().keyguard_secure
    }
}

impl BiometricManager for SimDevice {
    fn can_authenticate(&self) -> i32 {
        self.0.profile().effective_biometric_code()
    }
}

impl DialogPresenter for SimDevice {
    fn present(&self, dialog: FingerprintDialog) {
        lock(&self.0.shown_dialogs).push(dialog.text().clone());

        let events = match self.0.profile().legacy_script {
            CeremonyScript::Hold => {
                debug!("Parking fingerprint dialog");
                lock(&self.0.held_dialogs).push_back(dialog);
                return;
            }
            CeremonyScript::Play(events) => events,
        };

        // The dialog is dismissed when this returns
        let handler = dialog.handler();
        for event in events {
            if handler.is_finished() {
                break;
            }
            match event {
                SimEvent::Success => match dialog.seal(CEREMONY_PAYLOAD) {
                    Ok(_) => handler.on_success(),
                    Err(e) => handler.on_error(e.to_string()),
                },
                SimEvent::Failed => handler.on_failed(),
                SimEvent::Help { message } => handler.on_help(message),
                SimEvent::Error { message } => handler.on_error(message),
                SimEvent::Cancel => handler.on_cancelled(),
            }
        }
    }
}

impl PromptLauncher for SimDevice {
    fn authenticate(&self, prompt: PromptInfo, cancel: CancellationSignal, events: PromptEvents) {
        lock(&self.0.shown_prompts).push(prompt.clone());

        let script = match self.0.profile().modern_script {
            CeremonyScript::Hold => {
                debug!("Parking biometric prompt");
                lock(&self.0.held_prompts).push_back(HeldPrompt {
                    info: prompt,
                    cancel,
                    events,
                });
                return;
            }
            CeremonyScript::Play(script) => script,
        };

        for event in script {
            if cancel.is_cancelled() {
                break;
            }
            match event {
                SimEvent::Success => events.succeeded(),
                SimEvent::Failed => events.failed(),
                SimEvent::Help { message } => events.help(SIM_HELP_CODE, message),
                SimEvent::Error { message } => events.error(SIM_ERROR_CODE, message),
                SimEvent::Cancel => events.negative_button(),
            };
        }
    }
}

struct SimCredentialProvider {
    state: Arc<SimState>,
    keystore: SoftwareKeystore,
}

impl CredentialProvider for SimCredentialProvider {
    fn create_credential(&self) -> Result<Credential> {
        if !self.state.profile().credential_available {
            return Err(FpAuthError::Credential(format!(
                "keystore entry {} unavailable",
                self.keystore.alias()
            )));
        }
        self.keystore.create_credential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_code_derivation() {
        assert_eq!(DeviceProfile::modern().effective_biometric_code(), 0);

        let no_hardware = DeviceProfile {
            hardware_present: false,
            ..DeviceProfile::modern()
        };
        assert_eq!(no_hardware.effective_biometric_code(), 12);

        let none_enrolled = DeviceProfile {
            enrolled: 0,
            ..DeviceProfile::modern()
        };
        assert_eq!(none_enrolled.effective_biometric_code(), 11);

        let explicit = DeviceProfile {
            biometric_code: Some(1),
            ..DeviceProfile::modern()
        };
        assert_eq!(explicit.effective_biometric_code(), 1);
    }

    #[test]
    fn test_profile_parses_with_defaults() {
        let profile: DeviceProfile = serde_json::from_str(
            r#"{"api_level":26,"enrolled":0,"legacy_script":{"play":[{"type":"help","message":"Clean sensor"}]}}"#,
        )
        .unwrap();

        assert_eq!(profile.api_level, 26);
        assert_eq!(profile.enrolled, 0);
        assert!(profile.keyguard_secure);
        assert_eq!(
            profile.legacy_script,
            CeremonyScript::Play(vec![SimEvent::Help {
                message: "Clean sensor".to_string()
            }])
        );
        assert_eq!(profile.modern_script, CeremonyScript::default());
    }

    #[test]
    fn test_hold_script_parses_from_string() {
        let script: CeremonyScript = serde_json::from_str(r#""hold""#).unwrap();
        assert_eq!(script, CeremonyScript::Hold);
    }

    #[test]
    fn test_credential_provider_honors_profile() {
        let platform = SimulatedPlatform::new(DeviceProfile::legacy());
        let provider = platform.credential_provider();
        assert!(provider.create_credential().is_ok());

        platform.update_profile(|p| p.credential_available = false);
        assert!(provider.create_credential().is_err());
    }

    #[test]
    fn test_host_follows_profile() {
        let platform = SimulatedPlatform::new(DeviceProfile::modern());
        assert!(platform.current_host().is_some());

        platform.update_profile(|p| p.host_present = false);
        assert!(platform.current_host().is_none());
    }
}
