//! Purpose: Define the public Rust API boundary of the bridge.
//! Exports: Core types plus the bundled platform client and login flow.
//! Role: Public, additive-only surface used by the C ABI, the login utility and tests.
//! Invariants: Transport and response decoding stay private to this module.

mod login;
mod transport;
mod tweet_result;
mod x_client;

pub use crate::core::config::{BridgeConfig, ProxyFailurePolicy};
pub use crate::core::cookie::CookieRecord;
pub use crate::core::envelope::{Envelope, decode_input, encode};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::scraper::Scraper;
pub use crate::core::session::{Credentials, Session};
pub use crate::core::tweet::{Tweet, TweetProjection, normalize_tweet_id};
pub use login::{LoginCredentials, LoginPrompt, login};
pub use x_client::XClient;
