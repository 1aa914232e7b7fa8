//! Purpose: The two boundary operations expressed over plain Rust strings.
//! Exports: `initialize`, `get_tweet`, `ensure_initialized`.
//! Role: Decode input, drive the session, project the result; shared by the C ABI and tests.
//! Invariants: `None` input means the host passed a null pointer.
//! Invariants: Retrieval reports `not initialized` before looking at its input.
//! Invariants: In open account mode the cookie payload is validated as JSON but otherwise ignored.
#![allow(clippy::result_large_err)]

use crate::core::config::BridgeConfig;
use crate::core::cookie::CookieRecord;
use crate::core::envelope::decode_input;
use crate::core::error::{Error, ErrorKind};
use crate::core::scraper::Scraper;
use crate::core::session::{Credentials, Session};
use crate::core::tweet::{TweetProjection, normalize_tweet_id};
use serde_json::Value;

pub fn initialize<S: Scraper>(
    session: &Session<S>,
    config: &BridgeConfig,
    cookies_json: Option<&str>,
) -> Result<(), Error> {
    let credentials = if config.open_account {
        if let Some(raw) = cookies_json.filter(|raw| !raw.trim().is_empty()) {
            decode_input::<Value>(raw)?;
        }
        Credentials::OpenAccount
    } else {
        let raw = cookies_json.ok_or_else(null_input)?;
        Credentials::Cookies(decode_input::<Vec<CookieRecord>>(raw)?)
    };
    session.initialize(credentials, config.proxy.as_deref())
}

pub fn get_tweet<S: Scraper>(
    session: &Session<S>,
    tweet_id_json: Option<&str>,
) -> Result<TweetProjection, Error> {
    ensure_initialized(session)?;
    let raw = tweet_id_json.ok_or_else(null_input)?;
    let id = normalize_tweet_id(&decode_input::<String>(raw)?)?;
    session.get_tweet(&id).map(TweetProjection::from)
}

/// Initialization is one-way, so a positive answer cannot go stale before the lookup.
pub fn ensure_initialized<S: Scraper>(session: &Session<S>) -> Result<(), Error> {
    if session.is_initialized() {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::NotInitialized))
    }
}

fn null_input() -> Error {
    Error::new(ErrorKind::InvalidInput).with_message("input is null")
}
