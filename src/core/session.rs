//! Purpose: Hold at most one initialized scraping client behind a single lock.
//! Exports: `Session`, `Credentials`.
//! Role: State machine `Uninitialized -> Initialized` shared by every boundary call.
//! Invariants: One mutex guards the slot and every call into the client; no reentrancy.
//! Invariants: The slot is written once on success and never on a failed attempt.
//! Invariants: A poisoned lock is recovered; the slot content stays authoritative.

use crate::core::cookie::CookieRecord;
use crate::core::error::{Error, ErrorKind};
use crate::core::scraper::Scraper;
use crate::core::tweet::Tweet;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Cookies(Vec<CookieRecord>),
    OpenAccount,
}

type Factory<S> = Box<dyn Fn() -> S + Send + Sync>;

pub struct Session<S> {
    factory: Factory<S>,
    slot: Mutex<Option<S>>,
}

impl<S: Scraper> Session<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            slot: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    pub fn initialize(&self, credentials: Credentials, proxy: Option<&str>) -> Result<(), Error> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(Error::new(ErrorKind::AlreadyInitialized));
        }

        let mut client = (self.factory)();
        if let Some(proxy) = proxy {
            client.set_proxy(proxy)?;
            tracing::debug!("proxy applied");
        }

        match credentials {
            Credentials::OpenAccount => {
                client.login_open_account()?;
                tracing::info!("session initialized in open account mode");
            }
            Credentials::Cookies(cookies) => {
                client.set_cookies(&cookies);
                if !client.is_logged_in() {
                    tracing::warn!(cookies = cookies.len(), "credential check failed");
                    return Err(Error::new(ErrorKind::AuthenticationFailed));
                }
                tracing::info!(cookies = cookies.len(), "session initialized with cookies");
            }
        }

        *slot = Some(client);
        Ok(())
    }

    pub fn get_tweet(&self, id: &str) -> Result<Tweet, Error> {
        let mut slot = self.lock();
        let client = slot
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::NotInitialized))?;
        match client.get_tweet(id)? {
            Some(tweet) => Ok(tweet),
            None => {
                tracing::debug!(tweet_id = id, "tweet not found");
                Err(Error::new(ErrorKind::NotFound).with_message("tweet not found"))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<S>> {
        self.slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
