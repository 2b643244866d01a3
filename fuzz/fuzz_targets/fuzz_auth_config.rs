#![no_main]

use libfuzzer_sys::fuzz_target;
use fpauth_core::{AuthConfig, SessionConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let session = SessionConfig::default();

    if let Ok(config) = serde_json::from_str::<AuthConfig>(text) {
        // Resolution always yields a title and cancel label
        let resolved = config.resolve("", &session);
        match &config.title {
            Some(title) => assert_eq!(&resolved.title, title),
            None => assert_eq!(resolved.title, session.default_title),
        }
        match &config.cancel_text {
            Some(cancel_text) => assert_eq!(&resolved.cancel_text, cancel_text),
            None => assert_eq!(resolved.cancel_text, session.default_cancel_text),
        }
    }

    // Partial session files must fall back to defaults rather than panic
    let _ = serde_json::from_str::<SessionConfig>(text);
});
