//! Purpose: Exercise the exported C symbols the way a host process would.
//! Exports: Integration tests only.
//! Role: Verify pointer handling, envelopes and string ownership at the ABI.
//! Invariants: No call here may initialize the process-wide session or touch the network.
//! Notes: Only inputs that fail before any client is built are passed to `Initialize`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde_json::Value;
use tweetbridge::abi::{FreeString, GetTweet, Initialize};

fn take(raw: *mut c_char) -> String {
    assert!(!raw.is_null());
    let text = unsafe { CStr::from_ptr(raw) }
        .to_str()
        .expect("utf8")
        .to_string();
    FreeString(raw);
    text
}

fn call(f: extern "C" fn(*const c_char) -> *mut c_char, input: &str) -> Value {
    let input = CString::new(input).expect("cstring");
    let out = take(f(input.as_ptr()));
    serde_json::from_str(&out).expect("envelope is json")
}

fn err_message(envelope: &Value) -> &str {
    assert_eq!(envelope.as_object().map(|o| o.len()), Some(1), "{envelope}");
    envelope["Err"].as_str().expect("err envelope")
}

#[test]
fn get_tweet_before_initialize_is_not_initialized() {
    let input = CString::new("\"1607191066318454791\"").expect("cstring");
    let out = take(GetTweet(input.as_ptr()));
    assert_eq!(out, r#"{"Err":"not initialized"}"#);
}

#[test]
fn malformed_initialize_input_is_reported() {
    let envelope = call(Initialize, "[{\"Name\": \"auth_token\"");
    let message = err_message(&envelope);
    assert!(message.starts_with("invalid input"), "{message}");
    assert!(message.contains("auth_token"), "{message}");
}

#[test]
fn malformed_get_tweet_input_before_initialize_is_not_initialized() {
    let envelope = call(GetTweet, "{not json");
    assert_eq!(err_message(&envelope), "not initialized");
}

#[test]
fn null_tweet_id_is_an_error_not_a_crash() {
    let out = take(GetTweet(std::ptr::null()));
    assert_eq!(out, r#"{"Err":"not initialized"}"#);
}

#[test]
fn non_utf8_input_is_invalid() {
    let input = CString::new(vec![b'[', 0xff, b']']).expect("cstring");
    let out = take(Initialize(input.as_ptr()));
    assert!(out.contains("not valid UTF-8"), "{out}");

    let out = take(GetTweet(input.as_ptr()));
    assert_eq!(out, r#"{"Err":"not initialized"}"#);
}

#[test]
fn free_string_ignores_null() {
    FreeString(std::ptr::null_mut());
}
