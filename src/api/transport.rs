//! Purpose: Shared HTTP plumbing for the tweet client and the login flow.
//! Exports: `Transport`, `direct_agent`, `proxied_agent`, platform constants.
//! Role: Owns the `ureq` agent, the cookie jar and the guest token; installs web-client headers.
//! Invariants: Every response's `Set-Cookie` headers are folded back into the jar.
//! Invariants: Cookie values never appear in logs.
//! Invariants: Status and transport failures surface as `ErrorKind::Upstream` with the platform text.
//! Invariants: A rejected guest token is dropped so the next anonymous request activates a fresh one.
#![allow(clippy::result_large_err)]

use crate::api::tweet_result::{ApiError, PlatformErrors, classify_errors};
use crate::core::cookie::CookieRecord;
use crate::core::error::{Error, ErrorKind};
use crate::json::parse;
use cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(crate) const API_BASE: &str = "https://api.x.com";

/// Public bearer token of the platform's web client.
pub(crate) const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform error codes for an expired or unknown guest token.
const GUEST_TOKEN_ERROR_CODES: &[i64] = &[89, 239];

fn agent_builder() -> ureq::AgentBuilder {
    ureq::AgentBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
}

pub(crate) fn direct_agent() -> ureq::Agent {
    agent_builder().build()
}

pub(crate) fn proxied_agent(proxy: &str) -> Result<ureq::Agent, Error> {
    let parsed = ureq::Proxy::new(proxy).map_err(|err| {
        Error::new(ErrorKind::Config)
            .with_message(format!("invalid proxy url {proxy:?}"))
            .with_source(err)
    })?;
    Ok(agent_builder().proxy(parsed).build())
}

#[derive(Deserialize)]
struct GuestTokenResponse {
    guest_token: String,
}

#[derive(Deserialize)]
struct ErrorsEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

pub(crate) struct Transport {
    agent: ureq::Agent,
    jar: CookieJar,
    guest_token: Option<String>,
}

impl Transport {
    pub(crate) fn new(agent: ureq::Agent) -> Self {
        Self {
            agent,
            jar: CookieJar::new(),
            guest_token: None,
        }
    }

    pub(crate) fn set_agent(&mut self, agent: ureq::Agent) {
        self.agent = agent;
    }

    pub(crate) fn guest_token(&self) -> Option<&str> {
        self.guest_token.as_deref()
    }

    pub(crate) fn has_cookie(&self, name: &str) -> bool {
        self.jar.get(name).is_some()
    }

    pub(crate) fn replace_cookies(&mut self, records: &[CookieRecord]) {
        self.jar = CookieJar::new();
        for record in records {
            let mut cookie = Cookie::new(record.name.clone(), record.value.clone());
            if let Some(domain) = record.domain.as_ref().filter(|d| !d.is_empty()) {
                cookie.set_domain(domain.clone());
            }
            cookie.set_path(record.path.clone().unwrap_or_else(|| "/".to_string()));
            cookie.set_secure(record.secure);
            cookie.set_http_only(record.http_only);
            self.jar.add(cookie);
        }
    }

    pub(crate) fn cookie_records(&self) -> Vec<CookieRecord> {
        let mut records: Vec<CookieRecord> = self
            .jar
            .iter()
            .map(|cookie| CookieRecord {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
                domain: cookie.domain().map(str::to_string),
                path: cookie.path().map(str::to_string),
                expires: cookie
                    .expires_datetime()
                    .and_then(|at| at.format(&Rfc3339).ok()),
                secure: cookie.secure().unwrap_or(false),
                http_only: cookie.http_only().unwrap_or(false),
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Requests a fresh guest token for anonymous or pre-login traffic.
    pub(crate) fn activate_guest_token(&mut self) -> Result<(), Error> {
        self.guest_token = None;
        let url = format!("{API_BASE}/1.1/guest/activate.json");
        let response: GuestTokenResponse = self.send_json("POST", &url, None)?;
        tracing::debug!("guest token activated");
        let mut cookie = Cookie::new("gt", response.guest_token.clone());
        cookie.set_domain("x.com");
        cookie.set_path("/");
        cookie.set_secure(true);
        self.jar.add(cookie);
        self.guest_token = Some(response.guest_token);
        Ok(())
    }

    pub(crate) fn send_json<R>(
        &mut self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let text = self.send(method, url, body)?;
        parse::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Upstream)
                .with_message("invalid response json")
                .with_source(err)
        })
    }

    /// Sends one request and returns the response body.
    pub(crate) fn send(
        &mut self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<String, Error> {
        tracing::debug!(method, url = %strip_query(url), "request");
        let request = self.request(method, url);
        let response = match body {
            Some(body) => request.send_string(&body.to_string()),
            None if method == "GET" => request.call(),
            None => request.send_string(""),
        };
        match response {
            Ok(resp) => {
                self.store_set_cookies(&resp);
                resp.into_string().map_err(|err| {
                    Error::new(ErrorKind::Upstream)
                        .with_message("failed to read response body")
                        .with_source(err)
                })
            }
            Err(ureq::Error::Status(code, resp)) => Err(self.absorb_rejection(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Upstream)
                .with_message("request failed")
                .with_source(err)),
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {WEB_BEARER_TOKEN}"))
            .set("Accept", "*/*")
            .set("Accept-Language", "en-US,en;q=0.9")
            .set("Content-Type", "application/json")
            .set("Origin", "https://x.com")
            .set("Referer", "https://x.com/")
            .set("x-twitter-active-user", "yes")
            .set("x-twitter-client-language", "en");

        if let Some(header) = self.cookie_header() {
            request = request.set("Cookie", &header);
        }
        if let Some(csrf) = self.jar.get("ct0") {
            request = request.set("x-csrf-token", csrf.value());
        }
        if self.has_cookie("auth_token") {
            request = request.set("x-twitter-auth-type", "OAuth2Session");
        } else if let Some(token) = &self.guest_token {
            request = request.set("x-guest-token", token);
        }
        request
    }

    fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .jar
            .iter()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Folds a non-2xx response into the session state and returns its error.
    fn absorb_rejection(&mut self, code: u16, response: ureq::Response) -> Error {
        self.store_set_cookies(&response);
        let body = response.into_string().unwrap_or_default();
        let errors = parse::from_str::<ErrorsEnvelope>(&body)
            .map(|envelope| envelope.errors)
            .unwrap_or_default();
        if self.uses_guest_token() && guest_token_rejected(code, &errors) {
            tracing::info!(status = code, "guest token rejected, dropping it");
            self.guest_token = None;
            self.jar.remove(Cookie::from("gt"));
        }
        status_error(code, errors)
    }

    fn uses_guest_token(&self) -> bool {
        self.guest_token.is_some() && !self.has_cookie("auth_token")
    }

    fn store_set_cookies(&mut self, response: &ureq::Response) {
        for header in response.all("set-cookie") {
            let Ok(cookie) = Cookie::parse(header.to_string()) else {
                continue;
            };
            if is_expired(&cookie) {
                self.jar.remove(Cookie::from(cookie.name().to_string()));
            } else {
                self.jar.add(cookie);
            }
        }
    }
}

fn is_expired(cookie: &Cookie<'_>) -> bool {
    let max_age_gone = cookie
        .max_age()
        .is_some_and(|age| age.is_zero() || age.is_negative());
    let expired = cookie
        .expires_datetime()
        .is_some_and(|at| at <= OffsetDateTime::now_utc());
    max_age_gone || expired
}

fn guest_token_rejected(code: u16, errors: &[ApiError]) -> bool {
    matches!(code, 401 | 403)
        || errors
            .iter()
            .any(|err| err.code.is_some_and(|code| GUEST_TOKEN_ERROR_CODES.contains(&code)))
}

fn status_error(code: u16, errors: Vec<ApiError>) -> Error {
    match classify_errors(errors) {
        PlatformErrors::NotFound(message) => Error::new(ErrorKind::NotFound).with_message(message),
        PlatformErrors::Failed(err) => err,
        PlatformErrors::Empty if code == 404 => {
            Error::new(ErrorKind::NotFound).with_message(format!("status {code}"))
        }
        PlatformErrors::Empty => Error::upstream(format!("request failed with status {code}")),
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::{Transport, direct_agent, is_expired, proxied_agent, strip_query};
    use crate::core::cookie::CookieRecord;
    use crate::core::error::ErrorKind;
    use cookie::Cookie;

    fn transport() -> Transport {
        Transport::new(direct_agent())
    }

    #[test]
    fn malformed_proxy_is_config_error() {
        let err = proxied_agent("ftp://127.0.0.1:21").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("ftp://127.0.0.1:21"));

        let err = proxied_agent("http://127.0.0.1:notaport").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn well_formed_proxy_builds_agent() {
        assert!(proxied_agent("http://127.0.0.1:3128").is_ok());
    }

    #[test]
    fn replaced_cookies_round_trip_through_jar() {
        let mut transport = transport();
        transport.replace_cookies(&[
            CookieRecord::new("ct0", "xyz").with_domain("x.com"),
            CookieRecord::new("auth_token", "abc"),
        ]);
        assert!(transport.has_cookie("auth_token"));
        let records = transport.cookie_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "auth_token");
        assert_eq!(records[0].path.as_deref(), Some("/"));
        assert_eq!(records[1].domain.as_deref(), Some("x.com"));

        transport.replace_cookies(&[]);
        assert!(transport.cookie_records().is_empty());
        assert_eq!(transport.cookie_header(), None);
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let mut transport = transport();
        transport.replace_cookies(&[CookieRecord::new("a", "1"), CookieRecord::new("b", "2")]);
        let header = transport.cookie_header().expect("header");
        assert!(header == "a=1; b=2" || header == "b=2; a=1", "{header}");
    }

    #[test]
    fn expired_cookies_are_detected() {
        let gone = Cookie::parse("ct0=; Max-Age=0").expect("cookie");
        assert!(is_expired(&gone));
        let old = Cookie::parse("ct0=x; Expires=Thu, 01 Jan 1970 00:00:00 GMT").expect("cookie");
        assert!(is_expired(&old));
        let live = Cookie::parse("ct0=x; Max-Age=3600").expect("cookie");
        assert!(!is_expired(&live));
    }

    fn response(code: u16, body: &str) -> ureq::Response {
        ureq::Response::new(code, "status", body).expect("response")
    }

    fn guest_transport() -> Transport {
        let mut transport = transport();
        transport.guest_token = Some("1234".to_string());
        transport
    }

    #[test]
    fn no_status_found_is_not_found_on_any_status() {
        let body = r#"{"errors":[{"message":"_Missing: No status found with that ID.","code":144}]}"#;
        let err = transport().absorb_rejection(400, response(400, body));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("No status found"), "{err}");
    }

    #[test]
    fn status_without_platform_errors_maps_by_code() {
        let err = transport().absorb_rejection(404, response(404, ""));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = transport().absorb_rejection(500, response(500, "<html>"));
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.to_string(), "request failed with status 500");
        let body = r#"{"errors":[{"message":"Rate limit exceeded","code":88}]}"#;
        let err = transport().absorb_rejection(429, response(429, body));
        assert_eq!(err.to_string(), "Rate limit exceeded (88)");
    }

    #[test]
    fn rejected_guest_token_is_dropped() {
        let mut transport = guest_transport();
        let err = transport.absorb_rejection(403, response(403, ""));
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(transport.guest_token(), None);

        let mut transport = guest_transport();
        let body = r#"{"errors":[{"message":"Bad guest token.","code":239}]}"#;
        transport.absorb_rejection(400, response(400, body));
        assert_eq!(transport.guest_token(), None);
    }

    #[test]
    fn unrelated_failures_keep_guest_token() {
        let mut transport = guest_transport();
        transport.absorb_rejection(500, response(500, ""));
        assert_eq!(transport.guest_token(), Some("1234"));
        let body = r#"{"errors":[{"message":"_Missing: No status found with that ID.","code":144}]}"#;
        transport.absorb_rejection(404, response(404, body));
        assert_eq!(transport.guest_token(), Some("1234"));
    }

    #[test]
    fn cookie_sessions_ignore_guest_token_rejection() {
        let mut transport = guest_transport();
        transport.replace_cookies(&[CookieRecord::new("auth_token", "abc")]);
        transport.absorb_rejection(401, response(401, ""));
        assert_eq!(transport.guest_token(), Some("1234"));
    }

    #[test]
    fn strip_query_hides_variables() {
        assert_eq!(strip_query("https://a/b?variables=x"), "https://a/b");
        assert_eq!(strip_query("https://a/b"), "https://a/b");
    }
}
