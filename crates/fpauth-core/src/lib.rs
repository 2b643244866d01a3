//! fpauth-core - Single-flight biometric authentication across capability tiers
//!
//! This crate provides:
//! - Capability probing for legacy and unified biometric platforms
//! - Credential creation for legacy-tier ceremonies
//! - Host lifecycle tracking (foreground/background)
//! - The authentication session state machine and its tier strategies
//! - A JSON bridge facade and a simulated platform for hosts and tests

pub mod bridge;
pub mod cancel;
pub mod config;
pub mod credential;
pub mod error;
pub mod executor;
pub mod latch;
pub mod lifecycle;
pub mod platform;
pub mod probe;
pub mod session;
pub mod sim;
pub mod sink;
pub mod strategy;
pub mod types;

pub use bridge::{BridgeReply, BridgeRequest, FingerprintAuthModule, MODULE_NAME};
pub use cancel::CancellationSignal;
pub use config::{AuthConfig, PromptText, SessionConfig};
pub use credential::{Credential, CredentialProvider, SoftwareKeystore};
pub use error::{FpAuthError, Result};
pub use lifecycle::{LifecycleEvent, LifecycleTracker};
pub use platform::{HostContext, Platform};
pub use probe::CapabilityProbe;
pub use session::{Admission, AuthenticationSession, Rejection};
pub use sink::ResultSink;
pub use types::{CapabilityStatus, CapabilityTier, ErrorCode, ProbeResult, Support, TerminalResult};
