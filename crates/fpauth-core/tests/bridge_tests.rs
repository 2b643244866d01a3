//! Bridge facade tests over a simulated device

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::session_for;
use fpauth_core::sim::{CeremonyScript, DeviceProfile, SimEvent};
use fpauth_core::{Admission, BridgeReply, BridgeRequest, ErrorCode, FingerprintAuthModule, Rejection};

#[derive(Clone, Default)]
struct Replies(Arc<Mutex<Vec<BridgeReply>>>);

impl Replies {
    fn sink(&self) -> impl FnOnce(BridgeReply) + Send + 'static {
        let replies = Arc::clone(&self.0);
        move |reply| replies.lock().unwrap().push(reply)
    }

    fn all(&self) -> Vec<BridgeReply> {
        self.0.lock().unwrap().clone()
    }
}

fn module_for(profile: DeviceProfile) -> (FingerprintAuthModule, fpauth_core::sim::SimulatedPlatform) {
    let (session, platform) = session_for(profile);
    (FingerprintAuthModule::new(Arc::new(session)), platform)
}

#[test]
fn test_module_name() {
    let (module, _) = module_for(DeviceProfile::modern());
    assert_eq!(module.name(), "FingerprintAuth");
}

#[test]
fn test_is_supported_over_json() {
    let (module, _) = module_for(DeviceProfile::modern());
    let replies = Replies::default();

    module.handle_json(r#"{"type":"IsSupported"}"#, replies.sink());
    assert_eq!(
        replies.all(),
        vec![BridgeReply::Success {
            payload: Some("Fingerprint".to_string())
        }]
    );

    let (module, _) = module_for(DeviceProfile {
        enrolled: 0,
        ..DeviceProfile::legacy()
    });
    let replies = Replies::default();
    module.handle(BridgeRequest::IsSupported, replies.sink());

    let json = serde_json::to_value(&replies.all()[0]).unwrap();
    assert_eq!(json["type"], "Error");
    assert_eq!(json["message"], "Not supported.");
    assert_eq!(json["code"], 104);
}

#[test]
fn test_legacy_authenticate_over_json() {
    let (module, platform) = module_for(DeviceProfile {
        legacy_script: CeremonyScript::Play(vec![SimEvent::Cancel]),
        ..DeviceProfile::legacy()
    });
    let replies = Replies::default();

    let admission = module.handle_json(
        r#"{"type":"Authenticate","reason":"Approve","config":{"title":"Wallet","cancelText":"Back"}}"#,
        replies.sink(),
    );

    assert_eq!(admission, Admission::Pending);
    assert_eq!(
        replies.all(),
        vec![BridgeReply::Error {
            message: "User Cancelled".to_string(),
            code: ErrorCode::AuthenticationCanceled,
        }]
    );

    let dialog = &platform.shown_dialogs()[0];
    assert_eq!(dialog.title, "Wallet");
    assert_eq!(dialog.cancel_text, "Back");
    assert_eq!(dialog.description, "Approve");
}

#[tokio::test]
async fn test_modern_authenticate_and_host_cancel() {
    let (module, platform) = module_for(DeviceProfile {
        modern_script: CeremonyScript::Hold,
        ..DeviceProfile::modern()
    });
    let auth_replies = Replies::default();
    let cancel_replies = Replies::default();

    let admission = module.handle_json(r#"{"type":"Authenticate"}"#, auth_replies.sink());
    assert_eq!(admission, Admission::Pending);
    assert!(platform.take_held_prompt().is_some());

    module.handle_json(r#"{"type":"Cancel"}"#, cancel_replies.sink());
    assert_eq!(cancel_replies.all(), vec![BridgeReply::Ack]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        auth_replies.all(),
        vec![BridgeReply::Error {
            message: "User Cancelled".to_string(),
            code: ErrorCode::AuthenticationCanceled,
        }]
    );
}

#[test]
fn test_lifecycle_requests_drive_tracker() {
    let (module, _) = module_for(DeviceProfile::legacy());
    let replies = Replies::default();

    module.handle_json(r#"{"type":"HostPause"}"#, replies.sink());
    assert!(!module.session().lifecycle().is_foreground());

    let rejected = Replies::default();
    let admission = module.handle_json(r#"{"type":"Authenticate","reason":"r"}"#, rejected.sink());
    assert_eq!(admission, Admission::Rejected(Rejection::Background));
    assert!(rejected.all().is_empty());

    let replies = Replies::default();
    module.handle_json(r#"{"type":"HostResume"}"#, replies.sink());
    assert_eq!(replies.all(), vec![BridgeReply::Ack]);
    assert!(module.session().lifecycle().is_foreground());

    module.handle(BridgeRequest::HostDestroy, Replies::default().sink());
    assert!(!module.session().lifecycle().is_foreground());
}

#[test]
fn test_in_flight_authenticate_gets_no_reply() {
    let (module, platform) = module_for(DeviceProfile {
        legacy_script: CeremonyScript::Hold,
        ..DeviceProfile::legacy()
    });
    let first = Replies::default();
    let second = Replies::default();

    module.handle_json(r#"{"type":"Authenticate","reason":"one"}"#, first.sink());
    let admission = module.handle_json(r#"{"type":"Authenticate","reason":"two"}"#, second.sink());

    assert_eq!(admission, Admission::Rejected(Rejection::InFlight));
    assert!(second.all().is_empty());

    platform.take_held_dialog().unwrap().handler().on_success();
    assert_eq!(first.all(), vec![BridgeReply::Success { payload: None }]);
    assert!(second.all().is_empty());
}

#[test]
fn test_malformed_request_is_reported() {
    let (module, _) = module_for(DeviceProfile::modern());

    for line in ["not json", r#"{"type":"Enroll"}"#, r#"{"reason":"missing tag"}"#] {
        let replies = Replies::default();
        let admission = module.handle_json(line, replies.sink());
        assert_eq!(admission, Admission::Completed);

        match replies.all().as_slice() {
            [BridgeReply::Invalid { message }] => assert!(message.starts_with("Invalid request")),
            other => panic!("unexpected replies for {:?}: {:?}", line, other),
        }
    }
}
