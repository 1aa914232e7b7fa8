//! Purpose: Tweet model returned by the scraper and the projection sent to the host.
//! Exports: `Tweet`, `TweetProjection`, `normalize_tweet_id`.
//! Role: The projection is the only tweet shape that crosses the C boundary.
//! Invariants: A projection always carries all six fields; media lists are never null.
//! Invariants: Identifiers are opaque; only status URLs are rewritten to their id.

use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use url::Url;

const STATUS_HOSTS: &[&str] = &[
    "x.com",
    "twitter.com",
    "mobile.twitter.com",
    "mobile.x.com",
    "vxtwitter.com",
    "fxtwitter.com",
    "fixupx.com",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub name: String,
    pub username: String,
    pub permanent_url: String,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub gifs: Vec<String>,
    pub sensitive_content: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetProjection {
    pub name: String,
    pub username: String,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub gifs: Vec<String>,
    pub sensitive_content: bool,
}

impl From<Tweet> for TweetProjection {
    fn from(tweet: Tweet) -> Self {
        Self {
            name: tweet.name,
            username: tweet.username,
            photos: tweet.photos,
            videos: tweet.videos,
            gifs: tweet.gifs,
            sensitive_content: tweet.sensitive_content,
        }
    }
}

/// Accepts a bare id or a status URL and returns the id to look up.
pub fn normalize_tweet_id(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput).with_message("tweet id is empty"));
    }
    if !trimmed.contains("://") {
        return Ok(trimmed.to_string());
    }
    let url = Url::parse(trimmed).map_err(|err| {
        Error::new(ErrorKind::InvalidInput)
            .with_message(format!("invalid tweet url {trimmed:?}"))
            .with_source(err)
    })?;
    status_id_from_url(&url).ok_or_else(|| {
        Error::new(ErrorKind::InvalidInput)
            .with_message(format!("url is not a tweet status link: {trimmed:?}"))
    })
}

fn status_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(host.as_str());
    if !STATUS_HOSTS.contains(&host) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [_, "status", id, ..] | ["i", "web", "status", id, ..]
            if id.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Some((*id).to_string())
        }
        _ => None,
    }
}
