#![no_main]

use libfuzzer_sys::fuzz_target;
use fpauth_core::BridgeRequest;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding arbitrary input must not panic
    if let Ok(request) = serde_json::from_str::<BridgeRequest>(line) {
        // Anything accepted re-encodes to an equal request
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: BridgeRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(request, decoded);
    }
});
