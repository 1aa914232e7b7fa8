//! Purpose: C ABI bridge for hosts driving a scraping session (libtweetbridge).
//! Exports: `Initialize`, `GetTweet`, `FreeString`.
//! Role: Stable ABI surface; marshals C strings in and JSON envelopes out.
//! Invariants: Every call returns a newly allocated NUL-terminated UTF-8 JSON string.
//! Invariants: Returned strings are owned by the caller and released only via `FreeString`.
//! Invariants: Panics never unwind into the host; they surface as `{"Err": ...}`.
//! Invariants: The only non-envelope outcome is a process abort on a bad proxy under the abort policy.
#![allow(non_snake_case)]
#![allow(clippy::result_large_err)]

use crate::api::XClient;
use crate::core::config::{BridgeConfig, LOG_ENV, ProxyFailurePolicy};
use crate::core::envelope::encode;
use crate::core::error::{Error, ErrorKind};
use crate::core::session::Session;
use crate::dispatch;
use std::any::Any;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{LazyLock, Once};
use tracing_subscriber::EnvFilter;

static SESSION: LazyLock<Session<XClient>> = LazyLock::new(|| Session::new(XClient::new));
static TRACING_INIT: Once = Once::new();

/// `cookies_json`: JSON array of cookie records (ignored in open account mode).
#[unsafe(no_mangle)]
pub extern "C" fn Initialize(cookies_json: *const c_char) -> *mut c_char {
    init_tracing();
    let config = BridgeConfig::from_env();
    let result = contain_panics("Initialize", || {
        let input = read_input(cookies_json)?;
        dispatch::initialize(&SESSION, &config, input)
    });
    if let Err(err) = &result {
        if is_fatal(err, &config) {
            tracing::error!(error = %err, "proxy configuration failed, aborting");
            std::process::abort();
        }
        tracing::debug!(code = err.kind().code(), error = %err, "Initialize failed");
    }
    into_c_string(encode(result))
}

/// `tweet_id_json`: JSON string literal holding a tweet id or status URL.
#[unsafe(no_mangle)]
pub extern "C" fn GetTweet(tweet_id_json: *const c_char) -> *mut c_char {
    init_tracing();
    let result = contain_panics("GetTweet", || {
        dispatch::ensure_initialized(&SESSION)?;
        let input = read_input(tweet_id_json)?;
        dispatch::get_tweet(&SESSION, input)
    });
    if let Err(err) = &result {
        tracing::debug!(code = err.kind().code(), error = %err, "GetTweet failed");
    }
    into_c_string(encode(result))
}

#[unsafe(no_mangle)]
pub extern "C" fn FreeString(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(value));
    }
}

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn is_fatal(err: &Error, config: &BridgeConfig) -> bool {
    err.kind() == ErrorKind::Config && config.proxy_failure == ProxyFailurePolicy::Abort
}

fn read_input<'a>(input: *const c_char) -> Result<Option<&'a str>, Error> {
    if input.is_null() {
        return Ok(None);
    }
    let text = unsafe { CStr::from_ptr(input) }.to_str().map_err(|err| {
        Error::new(ErrorKind::InvalidInput)
            .with_message("input is not valid UTF-8")
            .with_source(err)
    })?;
    Ok(Some(text))
}

fn contain_panics<T, F>(operation: &str, f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let detail = panic_detail(payload.as_ref());
        tracing::error!(operation, panic = %detail, "operation panicked");
        Err(Error::new(ErrorKind::Internal).with_message(format!("{operation} panicked: {detail}")))
    })
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn into_c_string(text: String) -> *mut c_char {
    CString::new(text)
        .unwrap_or_else(|err| {
            let mut bytes = err.into_vec();
            bytes.retain(|byte| *byte != 0);
            CString::new(bytes).unwrap_or_default()
        })
        .into_raw()
}

#[cfg(test)]
mod tests {
    use super::{FreeString, contain_panics, into_c_string, is_fatal, read_input};
    use crate::core::config::{BridgeConfig, ProxyFailurePolicy};
    use crate::core::error::{Error, ErrorKind};
    use std::ffi::{CStr, CString};

    #[test]
    fn panics_become_internal_errors() {
        let result: Result<(), Error> = contain_panics("GetTweet", || panic!("boom"));
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "GetTweet panicked: boom");
    }

    #[test]
    fn interior_nul_is_stripped() {
        let raw = into_c_string("a\0b".to_string());
        let text = unsafe { CStr::from_ptr(raw) }.to_str().expect("utf8").to_string();
        FreeString(raw);
        assert_eq!(text, "ab");
    }

    #[test]
    fn invalid_utf8_is_invalid_input() {
        let bytes = CString::new(vec![0xff, 0xfe]).expect("cstring");
        let err = read_input(bytes.as_ptr()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn null_input_reads_as_none() {
        assert_eq!(read_input(std::ptr::null()).expect("read"), None);
    }

    #[test]
    fn only_config_errors_under_abort_are_fatal() {
        let abort = BridgeConfig::default();
        let report = BridgeConfig::default().with_proxy_failure(ProxyFailurePolicy::Report);
        let config_err = Error::new(ErrorKind::Config);
        assert!(is_fatal(&config_err, &abort));
        assert!(!is_fatal(&config_err, &report));
        assert!(!is_fatal(&Error::new(ErrorKind::Upstream), &abort));
    }
}
