#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

fn all_variants() -> Vec<BridgeError> {
    vec![
        BridgeError::RuntimeInitError("".into()),
        BridgeError::RuntimeNotInitialized,
        BridgeError::RuntimeShutdownError,
        BridgeError::InvalidLifecycleTransition {
            from: "a".into(),
            to: "b".into(),
        },
        BridgeError::NativeCallRejected,
        BridgeError::UnexpectedNullResult,
        BridgeError::ProtocolViolation("".into()),
        BridgeError::DecodeError("".into()),
        BridgeError::InvalidInput("".into()),
        BridgeError::NativeError("".into()),
        BridgeError::ConfigError("".into()),
        BridgeError::Internal("".into()),
    ]
}

#[test]
fn BridgeError___all_variants___have_unique_codes() {
    let codes: Vec<u32> = all_variants().iter().map(|e| e.error_code()).collect();
    let unique: std::collections::HashSet<u32> = codes.iter().copied().collect();

    assert_eq!(
        codes.len(),
        unique.len(),
        "All error codes should be unique"
    );
}

#[test]
fn BridgeError___from_code___roundtrips_every_code() {
    for err in all_variants() {
        let code = err.error_code();

        let rebuilt = BridgeError::from_code(code, "msg".into());

        assert_eq!(rebuilt.error_code(), code);
    }
}

#[test]
fn BridgeError___from_code_unknown___returns_internal() {
    let err = BridgeError::from_code(999, "unknown error".into());

    assert!(matches!(err, BridgeError::Internal(_)));
}

#[test]
fn BridgeError___native_error___displays_message() {
    let err = BridgeError::NativeError("who pointer is null".into());

    assert_eq!(err.to_string(), "native error: who pointer is null");
}

#[test]
fn BridgeError___invalid_transition___displays_states() {
    let err = BridgeError::InvalidLifecycleTransition {
        from: "ShutDown".into(),
        to: "Initializing".into(),
    };

    assert_eq!(
        err.to_string(),
        "invalid lifecycle transition from ShutDown to Initializing"
    );
}

#[test_case(BridgeError::RuntimeInitError("x".into()), true)]
#[test_case(BridgeError::RuntimeShutdownError, true)]
#[test_case(BridgeError::InvalidLifecycleTransition { from: "a".into(), to: "b".into() }, true)]
#[test_case(BridgeError::NativeCallRejected, false)]
#[test_case(BridgeError::UnexpectedNullResult, false)]
#[test_case(BridgeError::DecodeError("x".into()), false)]
fn BridgeError___is_fatal___only_lifecycle_errors(err: BridgeError, expected: bool) {
    assert_eq!(err.is_fatal(), expected);
}

#[test]
fn BridgeError___is_retryable___only_rejection() {
    let retryable: Vec<_> = all_variants()
        .into_iter()
        .filter(BridgeError::is_retryable)
        .collect();

    assert_eq!(retryable, vec![BridgeError::NativeCallRejected]);
}

#[test]
fn BridgeError___from_serde_error___converts_to_config_error() {
    let json_err = serde_json::from_str::<String>("invalid").unwrap_err();

    let err: BridgeError = json_err.into();

    assert!(matches!(err, BridgeError::ConfigError(_)));
}

#[test]
fn BridgeError___from_utf8_error___converts_to_decode_error() {
    let bytes = [0xffu8, 0xfe];
    let utf8_err = std::str::from_utf8(&bytes).unwrap_err();

    let err: BridgeError = utf8_err.into();

    assert!(matches!(err, BridgeError::DecodeError(_)));
}

#[test_case(BridgeError::RuntimeShutdownError, "3:runtime has been shut down" ; "shutdown")]
#[test_case(BridgeError::NativeError("boom".into()), "10:boom" ; "native error")]
#[test_case(BridgeError::DecodeError("bad byte".into()), "8:bad byte" ; "decode error")]
fn BridgeError___to_wire___prefixes_code(err: BridgeError, expected: &str) {
    assert_eq!(err.to_wire(), expected);
}

#[test]
fn BridgeError___from_wire___restores_cause() {
    assert_eq!(
        BridgeError::from_wire(&BridgeError::RuntimeShutdownError.to_wire()),
        BridgeError::RuntimeShutdownError
    );
    assert_eq!(
        BridgeError::from_wire("2:runtime is not initialized"),
        BridgeError::RuntimeNotInitialized
    );
    assert_eq!(
        BridgeError::from_wire("9:who is null"),
        BridgeError::InvalidInput("who is null".into())
    );
}

#[test]
fn BridgeError___from_wire_detail_with_colons___keeps_detail_whole() {
    assert_eq!(
        BridgeError::from_wire("10:a:b:c"),
        BridgeError::NativeError("a:b:c".into())
    );
}

#[test_case("who is not welcome" ; "no prefix")]
#[test_case("99:out of range" ; "unknown code")]
#[test_case("0:zero" ; "zero code")]
#[test_case("abc:not a number" ; "non numeric prefix")]
fn BridgeError___from_wire_without_known_code___is_native_error(text: &str) {
    assert_eq!(
        BridgeError::from_wire(text),
        BridgeError::NativeError(text.to_string())
    );
}
