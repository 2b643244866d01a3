//! Session and per-call prompt configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FpAuthError, Result};

/// Prompt heading used when the caller supplies none
pub const DEFAULT_TITLE: &str = "Authenticate";

/// Cancel affordance label used when the caller supplies none
pub const DEFAULT_CANCEL_TEXT: &str = "Cancel";

/// Label reported by `is_supported()`; the probe cannot tell modalities apart
pub const DEFAULT_SUPPORTED_KIND: &str = "Fingerprint";

/// Keystore alias for legacy-tier credentials
pub const DEFAULT_CREDENTIAL_ALIAS: &str = "fpauth_default_key";

/// Caller-supplied options for one authenticate() call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Prompt heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Label for the cancel affordance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_text: Option<String>,

    /// Purpose string shown to the user when no reason argument is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_cancel_text(mut self, cancel_text: impl Into<String>) -> Self {
        self.cancel_text = Some(cancel_text.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Resolve defaults into the text actually rendered by a prompt
    ///
    /// The explicit `reason` argument wins; `self.reason` is only used when it is empty.
    pub fn resolve(&self, reason: &str, session: &SessionConfig) -> PromptText {
        let description = if reason.is_empty() {
            self.reason.clone().unwrap_or_default()
        } else {
            reason.to_string()
        };

        PromptText {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| session.default_title.clone()),
            cancel_text: self
                .cancel_text
                .clone()
                .unwrap_or_else(|| session.default_cancel_text.clone()),
            description,
        }
    }
}

/// Fully resolved prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptText {
    pub title: String,
    pub cancel_text: String,
    pub description: String,
}

/// Session-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Title used when a call omits one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Cancel label used when a call omits one
    #[serde(default = "default_cancel_text")]
    pub default_cancel_text: String,

    /// Label returned by a successful support query
    #[serde(default = "default_supported_kind")]
    pub supported_kind: String,

    /// Keystore alias for legacy-tier credentials
    #[serde(default = "default_credential_alias")]
    pub credential_alias: String,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_cancel_text() -> String {
    DEFAULT_CANCEL_TEXT.to_string()
}

fn default_supported_kind() -> String {
    DEFAULT_SUPPORTED_KIND.to_string()
}

fn default_credential_alias() -> String {
    DEFAULT_CREDENTIAL_ALIAS.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            default_cancel_text: default_cancel_text(),
            supported_kind: default_supported_kind(),
            credential_alias: default_credential_alias(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no prompt can be rendered with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("default_title", &self.default_title),
            ("default_cancel_text", &self.default_cancel_text),
            ("supported_kind", &self.supported_kind),
            ("credential_alias", &self.credential_alias),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FpAuthError::Config(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_text() {
        let text = AuthConfig::default().resolve("Confirm payment", &SessionConfig::default());
        assert_eq!(text.title, "Authenticate");
        assert_eq!(text.cancel_text, "Cancel");
        assert_eq!(text.description, "Confirm payment");
    }

    #[test]
    fn test_caller_text_overrides_defaults() {
        let config = AuthConfig::default()
            .with_title("Sign in")
            .with_cancel_text("Not now");
        let text = config.resolve("", &SessionConfig::default());
        assert_eq!(text.title, "Sign in");
        assert_eq!(text.cancel_text, "Not now");
        assert_eq!(text.description, "");
    }

    #[test]
    fn test_reason_argument_wins_over_config_reason() {
        let config = AuthConfig::default().with_reason("from config");
        let session = SessionConfig::default();
        assert_eq!(config.resolve("from argument", &session).description, "from argument");
        assert_eq!(config.resolve("", &session).description, "from config");
    }

    #[test]
    fn test_auth_config_parses_camel_case_and_ignores_unknown_keys() {
        let config: AuthConfig = serde_json::from_str(
            r##"{"title":"Unlock","cancelText":"Back","imageColor":"#ff0000"}"##,
        )
        .unwrap();
        assert_eq!(config.title.as_deref(), Some("Unlock"));
        assert_eq!(config.cancel_text.as_deref(), Some("Back"));
        assert!(config.reason.is_none());
    }

    #[test]
    fn test_session_config_partial_file_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"default_title":"Verify"}"#).unwrap();
        assert_eq!(config.default_title, "Verify");
        assert_eq!(config.default_cancel_text, DEFAULT_CANCEL_TEXT);
        assert_eq!(config.supported_kind, DEFAULT_SUPPORTED_KIND);
    }

    #[test]
    fn test_session_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let config = SessionConfig {
            default_title: "Verify identity".to_string(),
            ..SessionConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_empty_required_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"credential_alias":"  "}"#).unwrap();

        match SessionConfig::load(&path) {
            Err(FpAuthError::Config(message)) => assert!(message.contains("credential_alias")),
            other => panic!("expected a config error, got {:?}", other),
        }
        assert!(SessionConfig::default().validate().is_ok());
    }
}
