//! Bridge facade
//!
//! Marshals host-runtime requests onto a session and its lifecycle tracker. Requests
//! and replies are JSON, one object per message. A rejected authenticate request
//! produces no reply at all, matching the callback contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::AuthConfig;
use crate::session::{Admission, AuthenticationSession};
use crate::sink::ResultSink;
use crate::types::{ErrorCode, Support, TerminalResult, NOT_SUPPORTED_MESSAGE};

/// Name the module registers under in the host runtime
pub const MODULE_NAME: &str = "FingerprintAuth";

/// Inbound bridge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeRequest {
    IsSupported,

    Authenticate {
        #[serde(default)]
        reason: String,
        #[serde(default)]
        config: AuthConfig,
    },

    /// Host cancels the current unified prompt
    Cancel,

    HostResume,

    HostPause,

    HostDestroy,
}

/// Outbound bridge reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeReply {
    /// Success callback; support queries carry the kind label
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },

    /// Error callback
    Error { message: String, code: ErrorCode },

    /// Lifecycle or cancel request acknowledged
    Ack,

    /// The request could not be decoded
    Invalid { message: String },
}

impl From<TerminalResult> for BridgeReply {
    fn from(result: TerminalResult) -> Self {
        match result.as_error() {
            None => BridgeReply::Success { payload: None },
            Some((message, code)) => BridgeReply::Error {
                message: message.to_string(),
                code,
            },
        }
    }
}

impl From<Support> for BridgeReply {
    fn from(support: Support) -> Self {
        match support {
            Support::Supported { kind } => BridgeReply::Success {
                payload: Some(kind),
            },
            Support::NotSupported { code } => BridgeReply::Error {
                message: format!("{}.", NOT_SUPPORTED_MESSAGE),
                code,
            },
        }
    }
}

/// Host-facing module wrapping one session
pub struct FingerprintAuthModule {
    session: Arc<AuthenticationSession>,
}

impl FingerprintAuthModule {
    pub fn new(session: Arc<AuthenticationSession>) -> Self {
        Self { session }
    }

    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    pub fn session(&self) -> &Arc<AuthenticationSession> {
        &self.session
    }

    /// Decode and handle one JSON request
    pub fn handle_json<R>(&self, line: &str, reply: R) -> Admission
    where
        R: FnOnce(BridgeReply) + Send + 'static,
    {
        match serde_json::from_str::<BridgeRequest>(line) {
            Ok(request) => self.handle(request, reply),
            Err(e) => {
                reply(BridgeReply::Invalid {
                    message: format!("Invalid request: {}", e),
                });
                Admission::Completed
            }
        }
    }

    /// Handle one request; `reply` fires at most once
    ///
    /// Requests other than authenticate reply synchronously and return
    /// [`Admission::Completed`].
    pub fn handle<R>(&self, request: BridgeRequest, reply: R) -> Admission
    where
        R: FnOnce(BridgeReply) + Send + 'static,
    {
        debug!("Bridge request: {:?}", request);

        match request {
            BridgeRequest::IsSupported => {
                reply(self.session.is_supported().into());
                Admission::Completed
            }
            BridgeRequest::Authenticate { reason, config } => {
                let sink = ResultSink::new(move |result| reply(result.into()));
                self.session.authenticate_with(&reason, &config, sink)
            }
            BridgeRequest::Cancel => {
                self.session.cancel();
                reply(BridgeReply::Ack);
                Admission::Completed
            }
            BridgeRequest::HostResume => {
                self.session.lifecycle().on_host_resume();
                reply(BridgeReply::Ack);
                Admission::Completed
            }
            BridgeRequest::HostPause => {
                self.session.lifecycle().on_host_pause();
                reply(BridgeReply::Ack);
                Admission::Completed
            }
            BridgeRequest::HostDestroy => {
                self.session.lifecycle().on_host_destroy();
                reply(BridgeReply::Ack);
                Admission::Completed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_request_parses_with_defaults() {
        let request: BridgeRequest =
            serde_json::from_str(r#"{"type":"Authenticate","reason":"Pay"}"#).unwrap();
        assert_eq!(
            request,
            BridgeRequest::Authenticate {
                reason: "Pay".to_string(),
                config: AuthConfig::default(),
            }
        );
    }

    #[test]
    fn test_error_reply_carries_integer_code() {
        let reply: BridgeReply = TerminalResult::cancelled().into();
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["message"], "User Cancelled");
        assert_eq!(json["code"], 106);
    }

    #[test]
    fn test_support_reply() {
        let supported: BridgeReply = Support::Supported {
            kind: "Fingerprint".to_string(),
        }
        .into();
        assert_eq!(
            supported,
            BridgeReply::Success {
                payload: Some("Fingerprint".to_string())
            }
        );

        let unsupported: BridgeReply = Support::NotSupported {
            code: ErrorCode::NotEnrolled,
        }
        .into();
        assert_eq!(
            unsupported,
            BridgeReply::Error {
                message: "Not supported.".to_string(),
                code: ErrorCode::NotEnrolled,
            }
        );
    }

    #[test]
    fn test_success_reply_omits_empty_payload() {
        let json = serde_json::to_string(&BridgeReply::from(TerminalResult::Success)).unwrap();
        assert_eq!(json, r#"{"type":"Success"}"#);
    }
}
