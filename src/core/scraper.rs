//! Purpose: Seam between the session holder and the client that talks to the platform.
//! Exports: `Scraper`.
//! Role: Lets the session layer stay ignorant of HTTP, auth headers and response shapes.
//! Invariants: Implementations need not be thread-safe; callers serialize every call.
//! Invariants: `get_tweet` returns `Ok(None)` for a missing, deleted or hidden tweet.

use crate::core::cookie::CookieRecord;
use crate::core::error::Error;
use crate::core::tweet::Tweet;

pub trait Scraper: Send {
    /// Routes all later requests through `proxy`. Fails with `ErrorKind::Config` on a bad URL.
    fn set_proxy(&mut self, proxy: &str) -> Result<(), Error>;

    /// Switches to anonymous access without user credentials.
    fn login_open_account(&mut self) -> Result<(), Error>;

    fn set_cookies(&mut self, cookies: &[CookieRecord]);

    /// Asks the platform whether the installed cookies belong to a live session.
    fn is_logged_in(&mut self) -> bool;

    fn get_tweet(&mut self, id: &str) -> Result<Option<Tweet>, Error>;
}

impl<S: Scraper + ?Sized> Scraper for Box<S> {
    fn set_proxy(&mut self, proxy: &str) -> Result<(), Error> {
        (**self).set_proxy(proxy)
    }

    fn login_open_account(&mut self) -> Result<(), Error> {
        (**self).login_open_account()
    }

    fn set_cookies(&mut self, cookies: &[CookieRecord]) {
        (**self).set_cookies(cookies)
    }

    fn is_logged_in(&mut self) -> bool {
        (**self).is_logged_in()
    }

    fn get_tweet(&mut self, id: &str) -> Result<Option<Tweet>, Error> {
        (**self).get_tweet(id)
    }
}
