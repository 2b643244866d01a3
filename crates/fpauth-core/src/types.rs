//! Core types: capability tiers, statuses, wire error codes and terminal results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message delivered with every capability-level rejection
pub const NOT_SUPPORTED_MESSAGE: &str = "Not supported";

/// Message delivered when the user dismisses the prompt
pub const USER_CANCELLED_MESSAGE: &str = "User Cancelled";

/// Message delivered when a legacy ceremony reports a failed match
pub const NOT_RECOGNIZED_MESSAGE: &str = "Not recognized";

/// Authentication strategy class selected from the platform API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    /// Platform predates any biometric API
    Unsupported,
    /// Custom-rendered dialog over the fingerprint manager
    LegacyAvailable,
    /// Unified platform biometric prompt
    ModernAvailable,
}

/// Outcome of a capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    Supported,
    NotSupported,
    NotPresent,
    NotEnrolled,
    NotAvailable,
}

impl CapabilityStatus {
    /// Wire code reported to callers for this status
    pub fn code(self) -> ErrorCode {
        match self {
            CapabilityStatus::Supported => ErrorCode::IsSupported,
            CapabilityStatus::NotSupported => ErrorCode::NotSupported,
            CapabilityStatus::NotPresent => ErrorCode::NotPresent,
            CapabilityStatus::NotEnrolled => ErrorCode::NotEnrolled,
            CapabilityStatus::NotAvailable => ErrorCode::NotAvailable,
        }
    }

    pub fn is_supported(self) -> bool {
        self == CapabilityStatus::Supported
    }
}

/// Tier and status pair produced by one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub tier: CapabilityTier,
    pub status: CapabilityStatus,
}

impl ProbeResult {
    pub fn new(tier: CapabilityTier, status: CapabilityStatus) -> Self {
        Self { tier, status }
    }
}

/// Stable integer error codes parsed by callers
///
/// These values are the wire contract and MUST NOT change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ErrorCode {
    /// Probe-only: biometrics can be used
    IsSupported = 100,
    NotSupported = 101,
    NotPresent = 102,
    NotAvailable = 103,
    NotEnrolled = 104,
    AuthenticationFailed = 105,
    AuthenticationCanceled = 106,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Constant name as exposed to bridge callers
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::IsSupported => "IS_SUPPORTED",
            ErrorCode::NotSupported => "NOT_SUPPORTED",
            ErrorCode::NotPresent => "NOT_PRESENT",
            ErrorCode::NotAvailable => "NOT_AVAILABLE",
            ErrorCode::NotEnrolled => "NOT_ENROLLED",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::AuthenticationCanceled => "AUTHENTICATION_CANCELED",
        }
    }

    /// All codes, in wire order
    pub fn all() -> [ErrorCode; 7] {
        [
            ErrorCode::IsSupported,
            ErrorCode::NotSupported,
            ErrorCode::NotPresent,
            ErrorCode::NotAvailable,
            ErrorCode::NotEnrolled,
            ErrorCode::AuthenticationFailed,
            ErrorCode::AuthenticationCanceled,
        ]
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.as_i32()
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        ErrorCode::all()
            .into_iter()
            .find(|code| code.as_i32() == value)
            .ok_or_else(|| format!("unknown error code: {}", value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

/// The one outcome delivered per accepted authenticate() call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TerminalResult {
    Success,
    Error { message: String, code: ErrorCode },
    Cancelled { code: ErrorCode },
}

impl TerminalResult {
    /// Capability-level rejection carrying the probe status code
    pub fn not_supported(code: ErrorCode) -> Self {
        TerminalResult::Error {
            message: NOT_SUPPORTED_MESSAGE.to_string(),
            code,
        }
    }

    /// Ceremony-level failure
    pub fn failed(message: impl Into<String>) -> Self {
        TerminalResult::Error {
            message: message.into(),
            code: ErrorCode::AuthenticationFailed,
        }
    }

    pub fn cancelled() -> Self {
        TerminalResult::Cancelled {
            code: ErrorCode::AuthenticationCanceled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TerminalResult::Success)
    }

    /// Error message and code as seen through the onError callback
    pub fn as_error(&self) -> Option<(&str, ErrorCode)> {
        match self {
            TerminalResult::Success => None,
            TerminalResult::Error { message, code } => Some((message.as_str(), *code)),
            TerminalResult::Cancelled { code } => Some((USER_CANCELLED_MESSAGE, *code)),
        }
    }
}

/// Result of an `is_supported()` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Support {
    /// Biometrics usable; `kind` is a generic label, never a specific modality
    Supported { kind: String },
    NotSupported { code: ErrorCode },
}

impl Support {
    pub fn is_supported(&self) -> bool {
        matches!(self, Support::Supported { .. })
    }
}
