//! Capability probing
//!
//! Classifies the device into a [`CapabilityTier`] and reports whether biometric
//! authentication can proceed on it. Probing only queries the platform; it never
//! touches session or lifecycle state.

use std::sync::Arc;
use tracing::debug;

use crate::platform::{biometric_codes, Platform, MIN_BIOMETRIC_API, UNIFIED_BIOMETRIC_API};
use crate::types::{CapabilityStatus, CapabilityTier, ProbeResult};

/// Inspects the platform and classifies its biometric capability
#[derive(Clone)]
pub struct CapabilityProbe {
    platform: Arc<dyn Platform>,
}

impl CapabilityProbe {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Tier selected purely from the API generation
    pub fn tier(&self) -> CapabilityTier {
        tier_for_api_level(self.platform.api_level())
    }

    /// Classify tier and status
    pub fn probe(&self) -> ProbeResult {
        let tier = self.tier();
        let status = match tier {
            CapabilityTier::Unsupported => CapabilityStatus::NotSupported,
            CapabilityTier::LegacyAvailable => self.probe_legacy(),
            CapabilityTier::ModernAvailable => self.probe_unified(),
        };

        debug!(
            "Probe: api_level={} tier={:?} status={:?}",
            self.platform.api_level(),
            tier,
            status
        );
        ProbeResult::new(tier, status)
    }

    fn probe_legacy(&self) -> CapabilityStatus {
        // Without a host there is nothing to ask
        let Some(host) = self.platform.current_host() else {
            return CapabilityStatus::NotAvailable;
        };

        let fingerprint = match host.fingerprint_manager() {
            Some(manager) if manager.is_hardware_detected() => manager,
            _ => return CapabilityStatus::NotPresent,
        };

        match host.keyguard_manager() {
            Some(keyguard) if keyguard.is_keyguard_secure() => {}
            _ => return CapabilityStatus::NotAvailable,
        }

        if !fingerprint.has_enrolled_fingerprints() {
            return CapabilityStatus::NotEnrolled;
        }

        CapabilityStatus::Supported
    }

    fn probe_unified(&self) -> CapabilityStatus {
        let Some(manager) = self
            .platform
            .current_host()
            .and_then(|host| host.biometric_manager())
        else {
            return CapabilityStatus::NotAvailable;
        };

        status_from_biometric_code(manager.can_authenticate())
    }
}

/// Tier for a platform API generation
pub fn tier_for_api_level(api_level: u32) -> CapabilityTier {
    if api_level < MIN_BIOMETRIC_API {
        CapabilityTier::Unsupported
    } else if api_level < UNIFIED_BIOMETRIC_API {
        CapabilityTier::LegacyAvailable
    } else {
        CapabilityTier::ModernAvailable
    }
}

/// Map a unified-manager result code; unrecognized codes are never treated as supported
pub fn status_from_biometric_code(code: i32) -> CapabilityStatus {
    match code {
        biometric_codes::BIOMETRIC_SUCCESS => CapabilityStatus::Supported,
        biometric_codes::BIOMETRIC_ERROR_NO_HARDWARE => CapabilityStatus::NotPresent,
        biometric_codes::BIOMETRIC_ERROR_HW_UNAVAILABLE => CapabilityStatus::NotAvailable,
        biometric_codes::BIOMETRIC_ERROR_NONE_ENROLLED => CapabilityStatus::NotEnrolled,
        _ => CapabilityStatus::NotAvailable,
    }
}
